/*
 * Copyright (c) Peter Bjorklund. All rights reserved. https://github.com/swamp/swamp
 * Licensed under the MIT License. See LICENSE in the project root for license information.
 */
use vnscript_bytecode::bank::{INTL_LOCATION, STRM_LOCATION};
use vnscript_bytecode::encode;
use vnscript_bytecode::prelude::*;
use vnscript_vm::prelude::*;

fn machine() -> Machine {
    let mut archive = Archive::new();
    archive.add(Scenario::new(0));
    Machine::new(archive, MachineSetup::default()).unwrap()
}

fn parse<P: ParamList>(tokens: &[Vec<u8>]) -> (Vec<ExpressionPiece>, usize) {
    let mut position = 0;
    let mut output = Vec::new();
    P::parse_all(tokens, &mut position, &mut output).unwrap();
    (output, position)
}

fn parse_err<P: ParamList>(tokens: &[Vec<u8>]) -> ParseError {
    let mut position = 0;
    let mut output = Vec::new();
    P::parse_all(tokens, &mut position, &mut output).unwrap_err()
}

fn extract<P: ParamList>(machine: &mut Machine, parsed: &[ExpressionPiece]) -> (P::Values, usize) {
    let mut position = 0;
    let values = P::extract_all(machine, parsed, &mut position).unwrap();
    (values, position)
}

#[test_log::test]
fn argc_keeps_input_order() {
    let mut machine = machine();
    let tokens = vec![encode::int_constant(3), encode::int_constant(9)];

    let (parsed, consumed) = parse::<(Argc<IntConstant>,)>(&tokens);
    assert_eq!(consumed, 2);

    let ((values,), _) = extract::<(Argc<IntConstant>,)>(&mut machine, &parsed);
    assert_eq!(values, vec![3, 9]);
}

#[test_log::test]
fn argc_of_nothing_is_empty() {
    let mut machine = machine();
    let (parsed, _) = parse::<(Argc<StrConstant>,)>(&[]);
    let ((values,), _) = extract::<(Argc<StrConstant>,)>(&mut machine, &parsed);
    assert!(values.is_empty());
}

#[test_log::test]
fn default_int_without_tokens() {
    let mut machine = machine();
    let (parsed, consumed) = parse::<(DefaultInt<18>,)>(&[]);
    assert_eq!(consumed, 0);
    assert!(parsed.is_empty());

    let ((value,), position) = extract::<(DefaultInt<18>,)>(&mut machine, &parsed);
    assert_eq!(value, 18);
    assert_eq!(position, 0);
}

#[test_log::test]
fn default_int_with_token_is_idempotent() {
    let mut machine = machine();
    let tokens = vec![encode::int_constant(-4)];

    for _ in 0..2 {
        let (parsed, consumed) = parse::<(DefaultInt<18>,)>(&tokens);
        assert_eq!(consumed, 1);
        let ((value,), position) = extract::<(DefaultInt<18>,)>(&mut machine, &parsed);
        assert_eq!(value, -4);
        assert_eq!(position, 1);
    }
}

#[test_log::test]
fn optional_string() {
    let mut machine = machine();
    let tokens = vec![encode::int_constant(1), encode::string("name")];

    let (parsed, _) = parse::<(IntConstant, Optional<StrConstant>)>(&tokens);
    let ((number, name), _) = extract::<(IntConstant, Optional<StrConstant>)>(&mut machine, &parsed);
    assert_eq!(number, 1);
    assert_eq!(name.as_deref(), Some("name"));

    let (parsed, _) = parse::<(IntConstant, Optional<StrConstant>)>(&tokens[..1]);
    let ((_, name), _) = extract::<(IntConstant, Optional<StrConstant>)>(&mut machine, &parsed);
    assert_eq!(name, None);
}

#[test_log::test]
fn type_mismatch_names_expected_and_actual() {
    let tokens = vec![encode::string("oops")];
    let mut position = 0;
    let mut output = Vec::new();
    let err = <(IntConstant,)>::parse_all(&tokens, &mut position, &mut output).unwrap_err();

    assert_eq!(
        err.to_string(),
        "IntConstant parse error. Expected type integer, but actually contained \"\"oops\"\""
    );
}

#[test_log::test]
fn missing_parameter() {
    let mut position = 0;
    let mut output = Vec::new();
    let err = <(IntConstant, IntConstant)>::parse_all(
        &[encode::int_constant(1)],
        &mut position,
        &mut output,
    )
    .unwrap_err();

    assert_eq!(
        err,
        ParseError::MissingParameter {
            descriptor: "IntConstant",
            position: 1
        }
    );
}

#[test_log::test]
fn int_reference_observes_live_memory() {
    let mut machine = machine();
    let tokens = vec![encode::memory_reference(INTL_LOCATION, 2)];

    let (parsed, _) = parse::<(IntReference,)>(&tokens);
    let ((location,), _) = extract::<(IntReference,)>(&mut machine, &parsed);
    assert_eq!(
        location,
        IntLocation::Memory(IntMemRef::new(IntBank::L, 2))
    );

    machine.write_int(location, 77).unwrap();
    let ((value,), _) = extract::<(IntConstant,)>(&mut machine, &parsed);
    assert_eq!(value, 77);
}

#[test_log::test]
fn string_reference_is_resolved_at_extraction() {
    let mut machine = machine();
    // strM[intA[0]]
    let token = {
        let mut bytes = vec![b'$', STRM_LOCATION, b'['];
        bytes.extend(encode::memory_reference(0, 0));
        bytes.push(b']');
        bytes
    };

    let (parsed, _) = parse::<(StrReference,)>(&[token]);
    machine
        .write_int(IntLocation::Memory(IntMemRef::new(IntBank::A, 0)), 5)
        .unwrap();

    let ((location,), _) = extract::<(StrReference,)>(&mut machine, &parsed);
    assert_eq!(location, StrMemRef::new(StrBank::M, 5));

    machine.write_string(location, "hello").unwrap();
    assert_eq!(machine.memory().string(location).unwrap(), "hello");
}

#[test_log::test]
fn complex_tuple() {
    let mut machine = machine();
    let token = encode::complex(&[encode::int_constant(4), encode::string("four")]);

    let (parsed, consumed) = parse::<(Complex<(IntConstant, StrConstant)>,)>(&[token]);
    assert_eq!(consumed, 1);
    let (((number, name),), _) =
        extract::<(Complex<(IntConstant, StrConstant)>,)>(&mut machine, &parsed);
    assert_eq!(number, 4);
    assert_eq!(name, "four");
}

type Pair = Complex<(IntConstant, IntConstant)>;

#[test_log::test]
fn complex_checks_each_contained_type() {
    let token = encode::complex(&[encode::string("abc"), encode::int_constant(1)]);

    assert_eq!(
        parse_err::<(Pair,)>(&[token]),
        ParseError::TypeMismatch {
            descriptor: "IntConstant",
            expected: ValueType::Integer,
            actual: "\"abc\"".to_string(),
        }
    );
}

#[test_log::test]
fn complex_needs_parentheses() {
    let err = parse_err::<(Pair,)>(&[encode::int_constant(5)]);

    assert!(matches!(
        err,
        ParseError::ShapeMismatch {
            descriptor: "Complex",
            ..
        }
    ));
}

#[test_log::test]
fn complex_arity() {
    let short = encode::complex(&[encode::int_constant(1)]);
    assert_eq!(
        parse_err::<(Pair,)>(&[short]),
        ParseError::MissingParameter {
            descriptor: "IntConstant",
            position: 1
        }
    );

    let long = encode::complex(&[
        encode::int_constant(1),
        encode::int_constant(2),
        encode::int_constant(3),
    ]);
    assert_eq!(
        parse_err::<(Pair,)>(&[long]),
        ParseError::UnexpectedParameter {
            descriptor: "Complex",
            position: 2
        }
    );
}

#[test_log::test]
#[cfg(debug_assertions)]
#[should_panic(expected = "Argc must be the last descriptor")]
fn argc_before_another_descriptor() {
    let tokens = vec![encode::int_constant(1), encode::int_constant(2)];
    let mut position = 0;
    let mut output = Vec::new();
    let _ = <(Argc<IntConstant>, IntConstant)>::parse_all(&tokens, &mut position, &mut output);
}

type IntOrString = Special<DefaultTagMapper, (IntConstant, StrConstant)>;

#[test_log::test]
fn special_selects_case_by_tag() {
    let mut machine = machine();
    let tokens = vec![
        encode::special(0, &[encode::int_constant(1)]),
        encode::special(1, &[encode::string("x")]),
    ];

    let (parsed, _) = parse::<(Argc<IntOrString>,)>(&tokens);
    let ((values,), _) = extract::<(Argc<IntOrString>,)>(&mut machine, &parsed);
    assert_eq!(
        values,
        vec![Overload2::First(1), Overload2::Second("x".to_string())]
    );
}

#[test_log::test]
fn special_with_complex_case() {
    let mut machine = machine();
    type Shapes = Special<DefaultTagMapper, (IntConstant, Complex<(IntConstant, IntConstant)>)>;
    let tokens = vec![encode::special(
        1,
        &[encode::int_constant(10), encode::int_constant(20)],
    )];

    let (parsed, _) = parse::<(Shapes,)>(&tokens);
    let ((value,), position) = extract::<(Shapes,)>(&mut machine, &parsed);
    assert_eq!(value, Overload2::Second((10, 20)));
    assert_eq!(position, 1);
}

#[test_log::test]
fn special_checks_the_selected_case() {
    let err = parse_err::<(IntOrString,)>(&[encode::special(0, &[encode::string("x")])]);
    assert!(matches!(
        err,
        ParseError::TypeMismatch {
            descriptor: "IntConstant",
            ..
        }
    ));

    type Shapes = Special<DefaultTagMapper, (IntConstant, Pair)>;
    let err = parse_err::<(Shapes,)>(&[encode::special(
        1,
        &[encode::int_constant(10), encode::string("twenty")],
    )]);
    assert!(matches!(
        err,
        ParseError::TypeMismatch {
            descriptor: "IntConstant",
            ..
        }
    ));
}

#[test_log::test]
fn special_needs_a_tag() {
    let err = parse_err::<(IntOrString,)>(&[encode::int_constant(1)]);

    assert!(matches!(
        err,
        ParseError::ShapeMismatch {
            descriptor: "Special",
            ..
        }
    ));
}

#[test_log::test]
fn special_with_unknown_tag() {
    let mut machine = machine();
    let tokens = vec![encode::special(5, &[encode::int_constant(1)])];

    let (parsed, _) = parse::<(IntOrString,)>(&tokens);
    let mut position = 0;
    let err = <(IntOrString,)>::extract_all(&mut machine, &parsed, &mut position).unwrap_err();
    assert_eq!(err, VmError::IllegalOverload { tag: 5, mapped: 5 });
}

#[test_log::test]
fn special_without_payload() {
    let mut machine = machine();
    let parsed = vec![ExpressionPiece::Special {
        tag: 0,
        pieces: Vec::new(),
    }];
    let mut position = 0;
    let err = <(IntOrString,)>::extract_all(&mut machine, &parsed, &mut position).unwrap_err();
    assert_eq!(err, VmError::EmptySpecial);
}

#[test_log::test]
fn colours() {
    let mut machine = machine();
    let rgb = vec![
        encode::int_constant(10),
        encode::int_constant(20),
        encode::int_constant(30),
    ];
    let (parsed, _) = parse::<(RgbMaybeAColour,)>(&rgb);
    let ((colour,), _) = extract::<(RgbMaybeAColour,)>(&mut machine, &parsed);
    assert_eq!(
        colour,
        Rgba {
            r: 10,
            g: 20,
            b: 30,
            a: 255
        }
    );

    let mut rgba = rgb;
    rgba.push(encode::int_constant(128));
    let (parsed, consumed) = parse::<(RgbMaybeAColour,)>(&rgba);
    assert_eq!(consumed, 4);
    let ((colour,), _) = extract::<(RgbMaybeAColour,)>(&mut machine, &parsed);
    assert_eq!(colour.a, 128);
}
