// vim: tw=80
//! The legacy syntax: stubs and expectations configured on the receiver.
#![deny(warnings)]

use mockspace::*;
use mockspace::syntax::should::{AnyInstanceSyntax, Should};

fn klass() -> Class {
    let klass = Class::new("Klass");
    klass.define("existing_method",
                 |_, _| Ok(Value::sym("existing_method_return_value")));
    klass
}

mod stub {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn returns_nothing_further_to_configure() {
        let space = Space::new();
        let d = space.double("a double");
        let configured: () = d.stub(&space, "foo").unwrap()
            .and_return(1).unwrap();
        assert_eq!((), configured);
        assert_eq!(Value::from(1), d.send("foo", ()).unwrap());
    }

    #[test]
    fn accepts_options() {
        let space = Space::new();
        let d = space.double("a double");
        d.stub_with_options(&space, "foo",
                            Options::new().expected_from("bar")).unwrap()
            .and_return(1).unwrap();
        assert_eq!(Value::from(1), d.send("foo", ()).unwrap());
    }

    #[test]
    fn string_and_symbol_spellings() {
        let space = Space::new();
        let d = space.double("a double");
        d.stub(&space, Symbol::new("foo")).unwrap().and_return(1).unwrap();
        assert_eq!(Value::from(1), d.send(String::from("foo"), ()).unwrap());
    }

    #[test]
    fn sequential_returns() {
        let space = Space::new();
        let d = space.double("a double");
        d.stub(&space, "foo").unwrap()
            .and_return_values([1, 2, 3]).unwrap();
        let got = (0..5)
            .map(|_| d.send("foo", ()).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(args![1, 2, 3, 3, 3], got);
    }

    #[test]
    fn overrides_a_real_method() {
        let space = Space::new();
        let obj = klass().new_instance();
        obj.stub(&space, "existing_method").unwrap().and_return(2).unwrap();
        assert_eq!(Value::from(2), obj.send("existing_method", ()).unwrap());
    }

    #[test]
    fn and_raise() {
        let space = Space::new();
        let d = space.double("a double");
        d.stub(&space, "foo").unwrap().and_raise("boom").unwrap();
        let e = d.send("foo", ()).unwrap_err();
        assert_eq!(Error::Raised("boom".to_owned()), e);
    }

    #[test]
    fn and_throw() {
        let space = Space::new();
        let d = space.double("a double");
        d.stub(&space, "foo").unwrap()
            .and_throw_value("done", 42).unwrap();
        let e = d.send("foo", ()).unwrap_err();
        assert_eq!(Error::Thrown{tag: "done".to_owned(), value: Value::from(42)},
                   e);
    }

    #[test]
    fn rejects_call_counts() {
        let space = Space::new();
        let d = space.double("a double");
        match d.stub(&space, "foo").unwrap().never() {
            Err(Error::NoMethod{method, ..}) => assert_eq!("never", method),
            other => panic!("Unexpected result {:?}", other.map(|_| ()))
        }
        match d.stub(&space, "bar").unwrap().exactly(3) {
            Err(Error::NoMethod{method, ..}) => assert_eq!("exactly", method),
            other => panic!("Unexpected result {:?}", other.map(|_| ()))
        }
    }
}

mod should_receive {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn expected_from_is_the_call_site() {
        let space = Space::new();
        let d = space.double("a double");
        d.should_receive_with_options(&space, "message",
            Options::new().expected_from("/path/to/blah.ext:37")).unwrap();
        let e = space.verify_all().unwrap_err();
        assert_eq!(Some("/path/to/blah.ext:37"), e.call_site());
        assert!(e.is_mock_expectation_error());
    }

    #[test]
    fn call_site_defaults_to_the_configuring_line() {
        let space = Space::new();
        let d = space.double("a double");
        let line = line!() + 1;
        d.should_receive(&space, "message").unwrap();
        let e = space.verify_all().unwrap_err();
        let expected = format!("{}:{}", file!(), line);
        assert_eq!(Some(expected.as_str()), e.call_site());
    }

    #[test]
    fn custom_message() {
        let space = Space::new();
        let obj = klass().new_instance();
        obj.should_receive_with_options(&space, "message",
            Options::new().message("recebi nada")).unwrap();
        let e = space.verify_all().unwrap_err();
        assert_eq!("recebi nada", e.to_string());
    }

    #[test]
    fn custom_message_after_a_similar_stub() {
        let space = Space::new();
        let d = space.double("a double");
        d.stub(&space, "foobar").unwrap();
        d.should_receive_with_options(&space, "foobar",
            Options::new().message("from mock")).unwrap();
        let e = space.verify_all().unwrap_err();
        assert_eq!("from mock", e.to_string());
    }

    #[test]
    fn default_message() {
        let space = Space::new();
        let d = space.double("a double");
        d.should_receive(&space, "foo").unwrap()
            .with(args![1]).unwrap()
            .twice().unwrap();
        d.send("foo", args![1]).unwrap();
        let e = space.verify_all().unwrap_err();
        assert_eq!("(Double \"a double\").foo((1))\n    expected: 2 times\n    received: 1 time",
                   e.to_string());
    }

    #[test]
    fn satisfied() {
        let space = Space::new();
        let d = space.double("a double");
        d.should_receive(&space, "foo").unwrap()
            .at_least(2).unwrap()
            .and_return("bar").unwrap();
        assert_eq!(Value::from("bar"), d.send("foo", ()).unwrap());
        assert_eq!(Value::from("bar"), d.send("foo", ()).unwrap());
        assert_eq!(Value::from("bar"), d.send("foo", ()).unwrap());
        space.verify_all().unwrap();
    }

    #[test]
    fn too_many_calls() {
        let space = Space::new();
        let d = space.double("a double");
        d.should_receive(&space, "foo").unwrap().once().unwrap();
        d.send("foo", ()).unwrap();
        let e = d.send("foo", ()).unwrap_err();
        assert!(matches!(e, Error::TooManyCalls{..}), "{:?}", e);
    }

    #[test]
    fn never_fails_when_received() {
        let space = Space::new();
        let d = space.double("a double");
        d.should_receive(&space, "foo").unwrap().never().unwrap();
        let e = d.send("foo", ()).unwrap_err();
        assert!(matches!(e, Error::TooManyCalls{..}), "{:?}", e);
    }

    #[test]
    fn never_passes_when_not_received() {
        let space = Space::new();
        let d = space.double("a double");
        d.should_receive(&space, "foo").unwrap().never().unwrap();
        space.verify_all().unwrap();
    }

    #[test]
    fn at_most_usize_max() {
        let space = Space::new();
        let d = space.double("a double");
        d.should_receive(&space, "foo").unwrap()
            .at_most(usize::MAX).unwrap()
            .and_return(1).unwrap();
        assert_eq!(Value::from(1), d.send("foo", ()).unwrap());
        assert_eq!(Value::from(1), d.send("foo", ()).unwrap());
        space.verify_all().unwrap();
    }

    #[test]
    fn exhausted_expectation_falls_back_to_stub() {
        let space = Space::new();
        let d = space.double("a double");
        d.stub(&space, "foo").unwrap().and_return(0).unwrap();
        d.should_receive(&space, "foo").unwrap()
            .twice().unwrap()
            .and_return(1).unwrap();
        assert_eq!(Value::from(1), d.send("foo", ()).unwrap());
        assert_eq!(Value::from(1), d.send("foo", ()).unwrap());
        assert_eq!(Value::from(0), d.send("foo", ()).unwrap());
        space.verify_all().unwrap();
    }

    #[test]
    fn and_yield() {
        use std::{cell::RefCell, rc::Rc};

        let space = Space::new();
        let d = space.double("a double");
        d.should_receive(&space, "each").unwrap()
            .and_yield(args![1]).unwrap()
            .and_yield(args![2]).unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen2 = seen.clone();
        let block = Block::new(move |args| {
            seen2.borrow_mut().extend_from_slice(args);
            Ok(Value::Nil)
        });
        d.send("each", Call::default().with_block(block)).unwrap();
        assert_eq!(args![1, 2], *seen.borrow());
        space.verify_all().unwrap();
    }
}

mod invocation_order {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assert_no_method(r: Result<MessageExpectation>, qualifier: &str) {
        match r {
            Err(Error::NoMethod{method, ..}) => assert_eq!(qualifier, method),
            other => panic!("Unexpected result {:?}", other)
        }
    }

    #[test]
    fn with_after_and_return() {
        let space = Space::new();
        let d = space.double("a double");
        let e = d.should_receive(&space, "foo").unwrap();
        e.clone().and_return(1).unwrap();
        assert_no_method(e.with(args!["1"]), "with");
    }

    #[test]
    fn with_after_and_raise() {
        let space = Space::new();
        let d = space.double("a double");
        let e = d.should_receive(&space, "foo").unwrap();
        e.clone().and_raise(1).unwrap();
        assert_no_method(e.with(args!["1"]), "with");
    }

    #[test]
    fn with_after_and_yield() {
        let space = Space::new();
        let d = space.double("a double");
        let e = d.should_receive(&space, "foo").unwrap()
            .and_yield(args![1]).unwrap();
        assert_no_method(e.with(args!["1"]), "with");
    }

    #[test]
    fn count_after_and_yield() {
        let space = Space::new();
        let d = space.double("a double");
        let e = d.should_receive(&space, "foo").unwrap()
            .and_yield(args![1]).unwrap();
        assert_no_method(e.once(), "once");
    }

    #[test]
    fn with_after_a_count() {
        let space = Space::new();
        let d = space.double("a double");
        let e = d.should_receive(&space, "foo").unwrap().twice().unwrap();
        assert_no_method(e.with(args![1]), "with");
    }

    #[test]
    fn any_instance_with_after_and_return() {
        let space = Space::new();
        let klass = klass();
        let e = klass.any_instance(&space).unwrap().stub("foo");
        e.clone().and_return(1).unwrap();
        assert_no_method(e.with(args!["1"]), "with");
    }
}

mod should_not_receive {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn is_negative() {
        let space = Space::new();
        let d = space.double("a double");
        let e = d.should_not_receive(&space, "foo").unwrap();
        assert!(e.is_negative());
        assert_eq!(Times::never(), e.times());
    }

    #[test]
    fn fails_when_received() {
        let space = Space::new();
        let d = space.double("a double");
        d.should_not_receive(&space, "foo").unwrap();
        let e = d.send("foo", ()).unwrap_err();
        assert!(matches!(e, Error::TooManyCalls{..}), "{:?}", e);
        assert!(e.is_mock_expectation_error());
    }

    #[test]
    fn passes_when_not_received() {
        let space = Space::new();
        let d = space.double("a double");
        d.should_not_receive(&space, "foo").unwrap();
        space.verify_all().unwrap();
    }

    #[test]
    fn with_constraint_fails_on_matching_args() {
        let space = Space::new();
        let d = space.double("a double");
        d.should_not_receive(&space, "foo").unwrap()
            .with(args![1]).unwrap();
        assert!(d.send("foo", args![1]).is_err());
    }

    #[test]
    fn with_constraint_passes_other_args() {
        let space = Space::new();
        let obj = klass().new_instance();
        obj.should_not_receive(&space, "existing_method").unwrap()
            .with(args![1]).unwrap();
        assert_eq!(Value::sym("existing_method_return_value"),
                   obj.send("existing_method", args![2]).unwrap());
        space.verify_all().unwrap();
    }

    #[test]
    fn combined_with_should_receive() {
        let space = Space::new();
        let d = space.double("a double");
        d.should_receive(&space, "foo").unwrap().with(args![1]).unwrap();
        d.should_not_receive(&space, "foo").unwrap().with(args![2]).unwrap();
        d.send("foo", args![1]).unwrap();
        space.verify_all().unwrap();
    }

    #[test]
    fn double_negation() {
        let space = Space::new();
        let d = space.double("a double");
        let e = d.should_not_receive(&space, "foo").unwrap()
            .never()
            .unwrap_err();
        assert!(matches!(e, Error::DoubleNegation{..}));
        assert!(e.to_string().contains("trying to negate it again"));
    }
}

mod unstub {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn restores_the_original() {
        let space = Space::new();
        let obj = klass().new_instance();
        obj.stub(&space, "existing_method").unwrap().and_return(1).unwrap();
        obj.unstub(&space, "existing_method").unwrap();
        assert_eq!(Value::sym("existing_method_return_value"),
                   obj.send("existing_method", ()).unwrap());
    }

    #[test]
    fn twice() {
        let space = Space::new();
        let obj = klass().new_instance();
        obj.stub(&space, "existing_method").unwrap();
        obj.unstub(&space, "existing_method").unwrap();
        let e = obj.unstub(&space, "existing_method").unwrap_err();
        assert_eq!("The method `existing_method` was not stubbed or was already unstubbed",
                   e.to_string());
    }

    #[test]
    fn never_stubbed() {
        let space = Space::new();
        let d = space.double("a double");
        let e = d.unstub(&space, "foo").unwrap_err();
        assert_eq!(Error::NotStubbed{method: "foo".to_owned()}, e);
    }

    #[test]
    fn keeps_expectations() {
        let space = Space::new();
        let obj = klass().new_instance();
        obj.should_receive(&space, "existing_method").unwrap()
            .and_return(1).unwrap();
        obj.stub(&space, "existing_method").unwrap().and_return(2).unwrap();
        obj.unstub(&space, "existing_method").unwrap();
        assert_eq!(Value::from(1), obj.send("existing_method", ()).unwrap());
        space.verify_all().unwrap();
    }

    #[test]
    fn string_unstubs_symbol() {
        let space = Space::new();
        let obj = klass().new_instance();
        obj.stub(&space, Symbol::new("existing_method")).unwrap()
            .and_return(1).unwrap();
        obj.unstub(&space, "existing_method".to_owned()).unwrap();
        assert_eq!(Value::sym("existing_method_return_value"),
                   obj.send("existing_method", ()).unwrap());
    }
}

mod stub_chain {
    use super::*;
    use pretty_assertions::assert_eq;

    fn walk(obj: &Object) -> Value {
        obj.send("one", ()).unwrap()
            .send("two", ()).unwrap()
            .send("three", ()).unwrap()
    }

    #[test]
    fn dotted_string() {
        let space = Space::new();
        let obj = klass().new_instance();
        obj.stub_chain(&space, "one.two.three").unwrap()
            .and_return(Value::sym("four")).unwrap();
        assert_eq!(Value::sym("four"), walk(&obj));
    }

    #[test]
    fn separate_names() {
        let space = Space::new();
        let obj = klass().new_instance();
        obj.stub_chain(&space, ["one", "two", "three"]).unwrap()
            .and_return(Value::sym("four")).unwrap();
        assert_eq!(Value::sym("four"), walk(&obj));
    }

    #[test]
    fn trailing_return_value() {
        let space = Space::new();
        let obj = klass().new_instance();
        obj.stub_chain(&space,
            Chain::from(["one", "two"]).returning("three", Value::sym("four")))
            .unwrap();
        assert_eq!(Value::sym("four"), walk(&obj));
    }

    #[test]
    fn empty() {
        let space = Space::new();
        let obj = klass().new_instance();
        let e = obj.stub_chain(&space, "").unwrap_err();
        assert_eq!(Error::EmptyChain, e);
    }
}
