/*
 * Copyright (c) Peter Bjorklund. All rights reserved. https://github.com/swamp/swamp
 * Licensed under the MIT License. See LICENSE in the project root for license information.
 */
pub mod bank;
pub mod encode;
pub mod error;
pub mod expression;
pub mod instruction;
pub mod parse;
pub mod prelude;
pub mod printable;
pub mod scenario;
