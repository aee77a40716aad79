// vim: tw=80
//! Verification and teardown of everything a test configured.
#![deny(warnings)]

use mockspace::*;
use mockspace::syntax::should::{AnyInstanceSyntax, Should};

static_assertions::assert_not_impl_any!(Space: Send, Sync);
static_assertions::assert_not_impl_any!(MessageExpectation: Send, Sync);

fn klass() -> Class {
    let klass = Class::new("Klass");
    klass.define("foo", |_, _| Ok(Value::from("real")));
    klass
}

mod scope {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn verifies() {
        let r = Space::scope(|space| {
            let d = space.double("a double");
            d.should_receive(space, "foo")?;
            Ok(())
        });
        let e = r.unwrap_err();
        assert!(matches!(e, Error::ExpectationNotSatisfied{..}), "{:?}", e);
    }

    #[test]
    fn passes() {
        Space::scope(|space| {
            let d = space.double("a double");
            d.should_receive(space, "foo")?.and_return(1)?;
            assert_eq!(Value::from(1), d.send("foo", ())?);
            Ok(())
        }).unwrap();
    }

    #[test]
    fn resets_after_a_failing_body() {
        let klass = klass();
        let obj = klass.new_instance();
        let r = Space::scope(|space| {
            obj.stub(space, "foo")?.and_return("stubbed")?;
            klass.any_instance(space)?.stub("bar").and_return(1)?;
            obj.send("foo", args![1, 2]).and_then(|_| obj.send("baz", ()))?;
            Ok(())
        });
        assert!(matches!(r, Err(Error::NoMethod{..})), "{:?}", r);
        assert_eq!(Value::from("real"), obj.send("foo", ()).unwrap());
        assert!(!obj.responds_to("bar"));
    }

    #[test]
    fn resets_after_a_failed_verification() {
        let klass = klass();
        let obj = klass.new_instance();
        let r = Space::scope(|space| {
            space.expect(&obj)?.to_receive("foo").twice()?;
            obj.send("foo", ())?;
            Ok(())
        });
        assert!(r.is_err());
        assert_eq!(Value::from("real"), obj.send("foo", ()).unwrap());
    }
}

mod verify_all {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reports_the_first_failure() {
        let space = Space::new();
        let a = space.double("a");
        let b = space.double("b");
        a.should_receive_with_options(&space, "foo",
                                      Options::new().message("first"))
            .unwrap();
        b.should_receive_with_options(&space, "foo",
                                      Options::new().message("second"))
            .unwrap();
        assert_eq!("first", space.verify_all().unwrap_err().to_string());
    }

    #[test]
    fn ignores_stubs() {
        let space = Space::new();
        let d = space.double("a double");
        d.stub(&space, "foo").unwrap().and_return(1).unwrap();
        space.verify_all().unwrap();
    }
}

mod reset_all {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn restores_and_forgets() {
        let space = Space::new();
        let klass = klass();
        let obj = klass.new_instance();
        obj.stub(&space, "foo").unwrap().and_return(1).unwrap();
        klass.any_instance(&space).unwrap().stub("foo").and_return(2).unwrap();
        let d = space.double("a double");
        d.should_receive(&space, "foo").unwrap();
        assert_eq!(Value::from(1), obj.send("foo", ()).unwrap());
        assert_eq!(Value::from(2),
                   klass.new_instance().send("foo", ()).unwrap());

        space.reset_all();
        assert_eq!(Value::from("real"), obj.send("foo", ()).unwrap());
        assert_eq!(Value::from("real"),
                   klass.new_instance().send("foo", ()).unwrap());
        assert!(space.proxies().is_empty());
        assert!(space.any_instance_recorders().is_empty());
        assert!(space.doubles().is_empty());
        assert!(space.registry().is_empty());
        space.verify_all().unwrap();
    }

    #[test]
    fn idempotent() {
        let space = Space::new();
        let obj = klass().new_instance();
        obj.stub(&space, "foo").unwrap().and_return(1).unwrap();
        space.reset_all();
        space.reset_all();
        assert_eq!(Value::from("real"), obj.send("foo", ()).unwrap());
    }

    #[test]
    fn on_drop() {
        let obj = klass().new_instance();
        {
            let space = Space::new();
            space.allow(&obj).unwrap()
                .to_receive("foo")
                .and_return(1).unwrap();
            assert_eq!(Value::from(1), obj.send("foo", ()).unwrap());
        }
        assert_eq!(Value::from("real"), obj.send("foo", ()).unwrap());
    }

    #[test]
    fn handles_outlive_the_space() {
        let obj = klass().new_instance();
        let e = {
            let space = Space::new();
            space.allow(&obj).unwrap().to_receive("foo")
        };
        assert!(e.clone().and_return(1).is_ok());
        assert_eq!(Value::from("real"), obj.send("foo", ()).unwrap());
    }

    #[test]
    fn singleton_methods_survive() {
        let space = Space::new();
        let obj = klass().new_instance();
        obj.define_singleton_method("foo", |_, _| Ok(Value::from("own")));
        obj.stub(&space, "foo").unwrap().and_return(1).unwrap();
        assert_eq!(Value::from(1), obj.send("foo", ()).unwrap());
        space.reset_all();
        assert_eq!(Value::from("own"), obj.send("foo", ()).unwrap());
    }
}

mod queries {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn one_proxy_per_object() {
        let space = Space::new();
        let obj = klass().new_instance();
        obj.stub(&space, "foo").unwrap();
        obj.stub(&space, "bar").unwrap();
        assert_eq!(1, space.proxies().len());
        let proxy = space.proxy_for(&obj);
        assert!(proxy.is_intercepting("foo"));
        assert!(proxy.is_intercepting("bar"));
        assert_eq!(1, proxy.expectations("foo").len());
    }

    #[test]
    fn doubles() {
        let space = Space::new();
        let named = space.double("named");
        let anonymous = space.anonymous_double();
        assert_eq!("Double \"named\"", named.to_string());
        assert_eq!("Double (anonymous)", anonymous.to_string());
        assert_eq!(2, space.doubles().len());
        assert!(named.is_double());
    }
}
