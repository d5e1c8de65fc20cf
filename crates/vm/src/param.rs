/*
 * Copyright (c) Peter Bjorklund. All rights reserved. https://github.com/swamp/swamp
 * Licensed under the MIT License. See LICENSE in the project root for license information.
 */

//! Parameter descriptors.
//!
//! A descriptor is a zero sized type that knows how to turn raw parameter
//! tokens into [`ExpressionPiece`]s (`parse`) and how to turn those pieces
//! into a typed value when the operation runs (`extract`). Operations list
//! their descriptors as a tuple, so the arity and types of a handler are
//! fixed at compile time and checked once when the instruction is first
//! parsed.

use crate::Machine;
use crate::error::VmError;
use crate::memory::IntLocation;
use std::marker::PhantomData;
use vnscript_bytecode::parse::{get_complex_param, get_data, parse_token};
use vnscript_bytecode::prelude::{ExpressionPiece, ParseError, StrMemRef, ValueType};

pub trait Param {
    type Value;

    /// Used in diagnostics.
    const NAME: &'static str;

    /// Complex descriptors read their nested pieces themselves instead of
    /// being handed the payload of a special parameter.
    const IS_COMPLEX: bool = false;

    /// Consumes every remaining parameter. Only legal as the last descriptor
    /// of a list.
    const IS_VARIADIC: bool = false;

    /// Parses the token at `position` (or more) and advances `position`.
    ///
    /// # Errors
    /// If a token is missing or has the wrong type.
    fn parse(
        tokens: &[Vec<u8>],
        position: &mut usize,
        output: &mut Vec<ExpressionPiece>,
    ) -> Result<(), ParseError>;

    /// Checks already parsed pieces, the contents of a `( ... )` or tagged
    /// parameter, the same way [`Param::parse`] checks tokens.
    ///
    /// # Errors
    /// If a piece is missing or has the wrong type.
    fn check(pieces: &[ExpressionPiece], position: &mut usize) -> Result<(), ParseError>;

    /// Consumes exactly what [`Param::parse`] produced.
    ///
    /// # Errors
    /// If the pieces can not be evaluated to the descriptor's type.
    fn extract(
        machine: &mut Machine,
        parsed: &[ExpressionPiece],
        position: &mut usize,
    ) -> Result<Self::Value, VmError>;
}

fn next_token<'a>(
    tokens: &'a [Vec<u8>],
    position: &mut usize,
    descriptor: &'static str,
) -> Result<&'a [u8], ParseError> {
    let token = tokens
        .get(*position)
        .ok_or(ParseError::MissingParameter {
            descriptor,
            position: *position,
        })?;
    *position += 1;
    Ok(token)
}

fn parse_typed(
    tokens: &[Vec<u8>],
    position: &mut usize,
    output: &mut Vec<ExpressionPiece>,
    descriptor: &'static str,
    expected: ValueType,
) -> Result<(), ParseError> {
    let token = next_token(tokens, position, descriptor)?;
    let piece = parse_token(token, get_data)?;
    expect_type(&piece, descriptor, expected)?;
    output.push(piece);
    Ok(())
}

fn expect_type(
    piece: &ExpressionPiece,
    descriptor: &'static str,
    expected: ValueType,
) -> Result<(), ParseError> {
    if piece.value_type() == expected {
        Ok(())
    } else {
        Err(ParseError::TypeMismatch {
            descriptor,
            expected,
            actual: piece.to_string(),
        })
    }
}

fn next_checked<'a>(
    pieces: &'a [ExpressionPiece],
    position: &mut usize,
    descriptor: &'static str,
) -> Result<&'a ExpressionPiece, ParseError> {
    let piece = pieces.get(*position).ok_or(ParseError::MissingParameter {
        descriptor,
        position: *position,
    })?;
    *position += 1;
    Ok(piece)
}

fn check_typed(
    pieces: &[ExpressionPiece],
    position: &mut usize,
    descriptor: &'static str,
    expected: ValueType,
) -> Result<(), ParseError> {
    let piece = next_checked(pieces, position, descriptor)?;
    expect_type(piece, descriptor, expected)
}

/// `T` must account for every one of `pieces`.
fn check_contents<T: ParamList>(
    descriptor: &'static str,
    pieces: &[ExpressionPiece],
) -> Result<(), ParseError> {
    let mut position = 0;
    T::check_all(pieces, &mut position)?;
    if position < pieces.len() {
        return Err(ParseError::UnexpectedParameter {
            descriptor,
            position,
        });
    }
    Ok(())
}

fn next_piece<'a>(
    parsed: &'a [ExpressionPiece],
    position: &mut usize,
    descriptor: &'static str,
) -> Result<&'a ExpressionPiece, VmError> {
    let piece = parsed.get(*position).ok_or(VmError::IllegalPosition {
        descriptor,
        position: *position,
        len: parsed.len(),
    })?;
    *position += 1;
    Ok(piece)
}

/// An integer value.
pub struct IntConstant;

impl Param for IntConstant {
    type Value = i32;
    const NAME: &'static str = "IntConstant";

    fn parse(
        tokens: &[Vec<u8>],
        position: &mut usize,
        output: &mut Vec<ExpressionPiece>,
    ) -> Result<(), ParseError> {
        parse_typed(tokens, position, output, Self::NAME, ValueType::Integer)
    }

    fn check(pieces: &[ExpressionPiece], position: &mut usize) -> Result<(), ParseError> {
        check_typed(pieces, position, Self::NAME, ValueType::Integer)
    }

    fn extract(
        machine: &mut Machine,
        parsed: &[ExpressionPiece],
        position: &mut usize,
    ) -> Result<i32, VmError> {
        let piece = next_piece(parsed, position, Self::NAME)?;
        machine.int_value(piece)
    }
}

/// A writable integer location.
pub struct IntReference;

impl Param for IntReference {
    type Value = IntLocation;
    const NAME: &'static str = "IntReference";

    fn parse(
        tokens: &[Vec<u8>],
        position: &mut usize,
        output: &mut Vec<ExpressionPiece>,
    ) -> Result<(), ParseError> {
        parse_typed(tokens, position, output, Self::NAME, ValueType::Integer)
    }

    fn check(pieces: &[ExpressionPiece], position: &mut usize) -> Result<(), ParseError> {
        check_typed(pieces, position, Self::NAME, ValueType::Integer)
    }

    fn extract(
        machine: &mut Machine,
        parsed: &[ExpressionPiece],
        position: &mut usize,
    ) -> Result<IntLocation, VmError> {
        let piece = next_piece(parsed, position, Self::NAME)?;
        machine.int_location(piece)
    }
}

/// A string value.
pub struct StrConstant;

impl Param for StrConstant {
    type Value = String;
    const NAME: &'static str = "StrConstant";

    fn parse(
        tokens: &[Vec<u8>],
        position: &mut usize,
        output: &mut Vec<ExpressionPiece>,
    ) -> Result<(), ParseError> {
        parse_typed(tokens, position, output, Self::NAME, ValueType::String)
    }

    fn check(pieces: &[ExpressionPiece], position: &mut usize) -> Result<(), ParseError> {
        check_typed(pieces, position, Self::NAME, ValueType::String)
    }

    fn extract(
        machine: &mut Machine,
        parsed: &[ExpressionPiece],
        position: &mut usize,
    ) -> Result<String, VmError> {
        let piece = next_piece(parsed, position, Self::NAME)?;
        machine.string_value(piece)
    }
}

/// A writable string location.
pub struct StrReference;

impl Param for StrReference {
    type Value = StrMemRef;
    const NAME: &'static str = "StrReference";

    fn parse(
        tokens: &[Vec<u8>],
        position: &mut usize,
        output: &mut Vec<ExpressionPiece>,
    ) -> Result<(), ParseError> {
        parse_typed(tokens, position, output, Self::NAME, ValueType::String)
    }

    fn check(pieces: &[ExpressionPiece], position: &mut usize) -> Result<(), ParseError> {
        check_typed(pieces, position, Self::NAME, ValueType::String)
    }

    fn extract(
        machine: &mut Machine,
        parsed: &[ExpressionPiece],
        position: &mut usize,
    ) -> Result<StrMemRef, VmError> {
        let piece = next_piece(parsed, position, Self::NAME)?;
        machine.str_location(piece)
    }
}

/// Every remaining parameter, each described by `D`.
///
/// Only valid as the last descriptor of a list, nothing is left for the
/// descriptors after it. Debug builds panic when parsing a list that breaks
/// this.
pub struct Argc<D>(PhantomData<D>);

impl<D: Param> Param for Argc<D> {
    type Value = Vec<D::Value>;
    const NAME: &'static str = "Argc";
    const IS_VARIADIC: bool = true;

    fn parse(
        tokens: &[Vec<u8>],
        position: &mut usize,
        output: &mut Vec<ExpressionPiece>,
    ) -> Result<(), ParseError> {
        while *position < tokens.len() {
            D::parse(tokens, position, output)?;
        }
        Ok(())
    }

    fn check(pieces: &[ExpressionPiece], position: &mut usize) -> Result<(), ParseError> {
        while *position < pieces.len() {
            D::check(pieces, position)?;
        }
        Ok(())
    }

    fn extract(
        machine: &mut Machine,
        parsed: &[ExpressionPiece],
        position: &mut usize,
    ) -> Result<Self::Value, VmError> {
        let mut values = Vec::with_capacity(parsed.len().saturating_sub(*position));
        while *position < parsed.len() {
            values.push(D::extract(machine, parsed, position)?);
        }
        Ok(values)
    }
}

/// One `( ... )` token holding the descriptors in `T`.
pub struct Complex<T>(PhantomData<T>);

impl<T: ParamList> Param for Complex<T> {
    type Value = T::Values;
    const NAME: &'static str = "Complex";
    const IS_COMPLEX: bool = true;

    fn parse(
        tokens: &[Vec<u8>],
        position: &mut usize,
        output: &mut Vec<ExpressionPiece>,
    ) -> Result<(), ParseError> {
        let token = next_token(tokens, position, Self::NAME)?;
        let piece = parse_token(token, get_complex_param)?;
        if !piece.is_complex() {
            return Err(ParseError::ShapeMismatch {
                descriptor: Self::NAME,
                actual: piece.to_string(),
            });
        }
        check_contents::<T>(Self::NAME, piece.contained_pieces())?;
        output.push(piece);
        Ok(())
    }

    /// A tagged parameter is accepted too, it is what a complex case of a
    /// [`Special`] is handed.
    fn check(pieces: &[ExpressionPiece], position: &mut usize) -> Result<(), ParseError> {
        let piece = next_checked(pieces, position, Self::NAME)?;
        if !piece.is_complex() && !piece.is_special() {
            return Err(ParseError::ShapeMismatch {
                descriptor: Self::NAME,
                actual: piece.to_string(),
            });
        }
        check_contents::<T>(Self::NAME, piece.contained_pieces())
    }

    fn extract(
        machine: &mut Machine,
        parsed: &[ExpressionPiece],
        position: &mut usize,
    ) -> Result<Self::Value, VmError> {
        let piece = next_piece(parsed, position, Self::NAME)?;
        let mut inner_position = 0;
        T::extract_all(machine, piece.contained_pieces(), &mut inner_position)
    }
}

/// An integer that falls back to `V` when no parameter is left.
pub struct DefaultInt<const V: i32>;

impl<const V: i32> Param for DefaultInt<V> {
    type Value = i32;
    const NAME: &'static str = "DefaultInt";

    fn parse(
        tokens: &[Vec<u8>],
        position: &mut usize,
        output: &mut Vec<ExpressionPiece>,
    ) -> Result<(), ParseError> {
        if *position < tokens.len() {
            IntConstant::parse(tokens, position, output)?;
        }
        Ok(())
    }

    fn check(pieces: &[ExpressionPiece], position: &mut usize) -> Result<(), ParseError> {
        if *position < pieces.len() {
            IntConstant::check(pieces, position)?;
        }
        Ok(())
    }

    fn extract(
        machine: &mut Machine,
        parsed: &[ExpressionPiece],
        position: &mut usize,
    ) -> Result<i32, VmError> {
        if *position < parsed.len() {
            IntConstant::extract(machine, parsed, position)
        } else {
            Ok(V)
        }
    }
}

/// `D` when a parameter is left, otherwise `None` without consuming.
pub struct Optional<D>(PhantomData<D>);

impl<D: Param> Param for Optional<D> {
    type Value = Option<D::Value>;
    const NAME: &'static str = "Optional";

    fn parse(
        tokens: &[Vec<u8>],
        position: &mut usize,
        output: &mut Vec<ExpressionPiece>,
    ) -> Result<(), ParseError> {
        if *position < tokens.len() {
            D::parse(tokens, position, output)?;
        }
        Ok(())
    }

    fn check(pieces: &[ExpressionPiece], position: &mut usize) -> Result<(), ParseError> {
        if *position < pieces.len() {
            D::check(pieces, position)?;
        }
        Ok(())
    }

    fn extract(
        machine: &mut Machine,
        parsed: &[ExpressionPiece],
        position: &mut usize,
    ) -> Result<Self::Value, VmError> {
        if *position < parsed.len() {
            D::extract(machine, parsed, position).map(Some)
        } else {
            Ok(None)
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rgba {
    pub r: i32,
    pub g: i32,
    pub b: i32,
    pub a: i32,
}

pub const OPAQUE: i32 = 255;

/// Three integers.
pub struct RgbColour;

impl Param for RgbColour {
    type Value = Rgba;
    const NAME: &'static str = "RgbColour";

    fn parse(
        tokens: &[Vec<u8>],
        position: &mut usize,
        output: &mut Vec<ExpressionPiece>,
    ) -> Result<(), ParseError> {
        for _ in 0..3 {
            IntConstant::parse(tokens, position, output)?;
        }
        Ok(())
    }

    fn check(pieces: &[ExpressionPiece], position: &mut usize) -> Result<(), ParseError> {
        for _ in 0..3 {
            IntConstant::check(pieces, position)?;
        }
        Ok(())
    }

    fn extract(
        machine: &mut Machine,
        parsed: &[ExpressionPiece],
        position: &mut usize,
    ) -> Result<Rgba, VmError> {
        Ok(Rgba {
            r: IntConstant::extract(machine, parsed, position)?,
            g: IntConstant::extract(machine, parsed, position)?,
            b: IntConstant::extract(machine, parsed, position)?,
            a: OPAQUE,
        })
    }
}

/// Three integers and an optional alpha.
pub struct RgbMaybeAColour;

impl Param for RgbMaybeAColour {
    type Value = Rgba;
    const NAME: &'static str = "RgbMaybeAColour";

    fn parse(
        tokens: &[Vec<u8>],
        position: &mut usize,
        output: &mut Vec<ExpressionPiece>,
    ) -> Result<(), ParseError> {
        RgbColour::parse(tokens, position, output)?;
        DefaultInt::<OPAQUE>::parse(tokens, position, output)
    }

    fn check(pieces: &[ExpressionPiece], position: &mut usize) -> Result<(), ParseError> {
        RgbColour::check(pieces, position)?;
        DefaultInt::<OPAQUE>::check(pieces, position)
    }

    fn extract(
        machine: &mut Machine,
        parsed: &[ExpressionPiece],
        position: &mut usize,
    ) -> Result<Rgba, VmError> {
        let colour = RgbColour::extract(machine, parsed, position)?;
        Ok(Rgba {
            a: DefaultInt::<OPAQUE>::extract(machine, parsed, position)?,
            ..colour
        })
    }
}

/// Picks which case of a [`Special`] handles a tagged parameter.
pub trait TagMapper {
    fn map(piece: &ExpressionPiece) -> i32;
}

/// Uses the tag byte as the case index.
pub struct DefaultTagMapper;

impl TagMapper for DefaultTagMapper {
    fn map(piece: &ExpressionPiece) -> i32 {
        piece.overload_tag().unwrap_or(-1)
    }
}

/// The cases of a [`Special`], implemented for descriptor tuples.
pub trait SpecialCases {
    type Value;

    /// Checks the payload of `special` against the case at `index`. Indices
    /// that are not a case pass, extraction reports them.
    ///
    /// # Errors
    /// If the payload does not fit the case.
    fn check_case(index: i32, special: &ExpressionPiece) -> Result<(), ParseError>;

    /// # Errors
    /// If `index` is not one of the cases, or the case fails to extract.
    fn extract_case(
        index: i32,
        machine: &mut Machine,
        parsed: &[ExpressionPiece],
        position: &mut usize,
        special: &ExpressionPiece,
    ) -> Result<Self::Value, VmError>;
}

fn check_case_for<D: Param>(special: &ExpressionPiece) -> Result<(), ParseError> {
    if D::IS_COMPLEX {
        check_contents::<(D,)>(D::NAME, std::slice::from_ref(special))
    } else {
        check_contents::<(D,)>(D::NAME, special.contained_pieces())
    }
}

fn extract_case_for<D: Param>(
    machine: &mut Machine,
    parsed: &[ExpressionPiece],
    position: &mut usize,
    special: &ExpressionPiece,
) -> Result<D::Value, VmError> {
    if D::IS_COMPLEX {
        D::extract(machine, parsed, position)
    } else {
        *position += 1;
        let mut inner_position = 0;
        D::extract(machine, special.contained_pieces(), &mut inner_position)
    }
}

/// A tagged parameter (`a<tag> payload`). `M` maps the tag to an index into
/// the descriptor tuple `T`.
pub struct Special<M, T>(PhantomData<(M, T)>);

impl<M: TagMapper, T: SpecialCases> Special<M, T> {
    fn check_special(piece: &ExpressionPiece) -> Result<(), ParseError> {
        if !piece.is_special() {
            return Err(ParseError::ShapeMismatch {
                descriptor: Self::NAME,
                actual: piece.to_string(),
            });
        }
        // an empty payload is reported when extracted
        if piece.contained_pieces().is_empty() {
            return Ok(());
        }
        T::check_case(M::map(piece), piece)
    }
}

impl<M: TagMapper, T: SpecialCases> Param for Special<M, T> {
    type Value = T::Value;
    const NAME: &'static str = "Special";

    fn parse(
        tokens: &[Vec<u8>],
        position: &mut usize,
        output: &mut Vec<ExpressionPiece>,
    ) -> Result<(), ParseError> {
        let token = next_token(tokens, position, Self::NAME)?;
        let piece = parse_token(token, get_data)?;
        Self::check_special(&piece)?;
        output.push(piece);
        Ok(())
    }

    fn check(pieces: &[ExpressionPiece], position: &mut usize) -> Result<(), ParseError> {
        let piece = next_checked(pieces, position, Self::NAME)?;
        Self::check_special(piece)
    }

    fn extract(
        machine: &mut Machine,
        parsed: &[ExpressionPiece],
        position: &mut usize,
    ) -> Result<Self::Value, VmError> {
        let special = parsed.get(*position).ok_or(VmError::IllegalPosition {
            descriptor: Self::NAME,
            position: *position,
            len: parsed.len(),
        })?;
        if special.contained_pieces().is_empty() {
            return Err(VmError::EmptySpecial);
        }

        let index = M::map(special);
        T::extract_case(index, machine, parsed, position, special)
    }
}

macro_rules! impl_special_cases {
    ($overload:ident; $($index:literal => $name:ident $variant:ident),+) => {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum $overload<$($name),+> {
            $($variant($name)),+
        }

        impl<$($name: Param),+> SpecialCases for ($($name,)+) {
            type Value = $overload<$($name::Value),+>;

            fn check_case(index: i32, special: &ExpressionPiece) -> Result<(), ParseError> {
                match index {
                    $($index => check_case_for::<$name>(special),)+
                    _ => Ok(()),
                }
            }

            fn extract_case(
                index: i32,
                machine: &mut Machine,
                parsed: &[ExpressionPiece],
                position: &mut usize,
                special: &ExpressionPiece,
            ) -> Result<Self::Value, VmError> {
                match index {
                    $($index => Ok($overload::$variant(extract_case_for::<$name>(
                        machine, parsed, position, special,
                    )?)),)+
                    mapped => Err(VmError::IllegalOverload {
                        tag: special.overload_tag().unwrap_or(-1),
                        mapped,
                    }),
                }
            }
        }
    };
}

impl_special_cases!(Overload2; 0 => A First, 1 => B Second);
impl_special_cases!(Overload3; 0 => A First, 1 => B Second, 2 => C Third);
impl_special_cases!(Overload4; 0 => A First, 1 => B Second, 2 => C Third, 3 => D Fourth);

/// An ordered list of descriptors, implemented for tuples of up to eight.
pub trait ParamList {
    type Values;

    /// # Errors
    /// If any descriptor fails to parse.
    fn parse_all(
        tokens: &[Vec<u8>],
        position: &mut usize,
        output: &mut Vec<ExpressionPiece>,
    ) -> Result<(), ParseError>;

    /// # Errors
    /// If any descriptor rejects its pieces.
    fn check_all(pieces: &[ExpressionPiece], position: &mut usize) -> Result<(), ParseError>;

    /// # Errors
    /// If any descriptor fails to extract.
    fn extract_all(
        machine: &mut Machine,
        parsed: &[ExpressionPiece],
        position: &mut usize,
    ) -> Result<Self::Values, VmError>;
}

fn debug_assert_variadic_last(variadic: &[bool]) {
    debug_assert!(
        variadic.iter().rev().skip(1).all(|is_variadic| !is_variadic),
        "Argc must be the last descriptor of a list"
    );
}

macro_rules! impl_param_list {
    ($($name:ident),*) => {
        impl<$($name: Param),*> ParamList for ($($name,)*) {
            type Values = ($($name::Value,)*);

            #[allow(unused_variables)]
            fn parse_all(
                tokens: &[Vec<u8>],
                position: &mut usize,
                output: &mut Vec<ExpressionPiece>,
            ) -> Result<(), ParseError> {
                debug_assert_variadic_last(&[$($name::IS_VARIADIC),*]);
                $($name::parse(tokens, position, output)?;)*
                Ok(())
            }

            #[allow(unused_variables)]
            fn check_all(
                pieces: &[ExpressionPiece],
                position: &mut usize,
            ) -> Result<(), ParseError> {
                debug_assert_variadic_last(&[$($name::IS_VARIADIC),*]);
                $($name::check(pieces, position)?;)*
                Ok(())
            }

            #[allow(unused_variables)]
            fn extract_all(
                machine: &mut Machine,
                parsed: &[ExpressionPiece],
                position: &mut usize,
            ) -> Result<Self::Values, VmError> {
                Ok(($($name::extract(machine, parsed, position)?,)*))
            }
        }
    };
}

impl_param_list!();
impl_param_list!(A);
impl_param_list!(A, B);
impl_param_list!(A, B, C);
impl_param_list!(A, B, C, D);
impl_param_list!(A, B, C, D, E);
impl_param_list!(A, B, C, D, E, F);
impl_param_list!(A, B, C, D, E, F, G);
impl_param_list!(A, B, C, D, E, F, G, H);
