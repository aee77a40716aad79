// vim: tw=80
//! Which syntaxes a [`Space`](crate::Space) accepts.

use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(feature = "should")] {
        /// With the `should` feature, the legacy syntax counts as explicitly
        /// enabled from the start.
        const SHOULD_EXPLICIT_BY_DEFAULT: bool = true;
    } else {
        const SHOULD_EXPLICIT_BY_DEFAULT: bool = false;
    }
}

/// A spelling of the configuration surface.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Syntax {
    /// `obj.stub(..)`, `obj.should_receive(..)`, `Class::any_instance`
    Should,
    /// `space.allow(..)`, `space.expect(..)`
    Expect,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Configuration {
    syntaxes: Vec<Syntax>,
    should_explicit: bool,
}

impl Configuration {
    pub fn new() -> Self {
        Configuration {
            syntaxes: vec![Syntax::Should, Syntax::Expect],
            should_explicit: SHOULD_EXPLICIT_BY_DEFAULT
        }
    }

    /// The enabled syntaxes.
    pub fn syntax(&self) -> &[Syntax] {
        &self.syntaxes
    }

    /// Enable exactly the given syntaxes.
    ///
    /// Enabling [`Syntax::Should`] this way stops deprecation reports for it.
    pub fn set_syntax<I>(&mut self, syntaxes: I)
        where I: IntoIterator<Item = Syntax>
    {
        self.syntaxes.clear();
        for s in syntaxes {
            if !self.syntaxes.contains(&s) {
                self.syntaxes.push(s);
            }
        }
        self.should_explicit = self.is_enabled(Syntax::Should);
    }

    /// Enable both syntaxes, with the legacy one deprecated.
    pub fn reset_syntaxes_to_default(&mut self) {
        self.syntaxes = vec![Syntax::Should, Syntax::Expect];
        self.should_explicit = SHOULD_EXPLICIT_BY_DEFAULT;
    }

    pub fn is_enabled(&self, syntax: Syntax) -> bool {
        self.syntaxes.contains(&syntax)
    }

    /// Is the legacy syntax enabled without being asked for?
    pub fn should_is_deprecated(&self) -> bool {
        self.is_enabled(Syntax::Should) && !self.should_explicit
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration::new()
    }
}

#[cfg(test)]
mod t {
    use super::*;

    #[test]
    fn explicit_should() {
        let mut c = Configuration::new();
        c.set_syntax([Syntax::Should]);
        assert_eq!(&[Syntax::Should], c.syntax());
        assert!(!c.should_is_deprecated());
        c.reset_syntaxes_to_default();
        assert!(c.is_enabled(Syntax::Expect));
        assert_eq!(!cfg!(feature = "should"), c.should_is_deprecated());
    }

    #[test]
    fn expect_only() {
        let mut c = Configuration::new();
        c.set_syntax([Syntax::Expect, Syntax::Expect]);
        assert_eq!(&[Syntax::Expect], c.syntax());
        assert!(!c.should_is_deprecated());
    }
}
