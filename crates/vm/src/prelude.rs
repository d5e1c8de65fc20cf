/*
 * Copyright (c) Peter Bjorklund. All rights reserved. https://github.com/swamp/swamp
 * Licensed under the MIT License. See LICENSE in the project root for license information.
 */
pub use crate::{
    FrameKind, LongOperation, Machine, MachineSetup, ProgramCounter, UndoEntry,
    adapter::{ChildAdapter, MultiDispatch, RangeAdapter, UndoAdapter},
    error::{RegistrationError, VmError},
    memory::{IntLocation, LocalMemory, Memory},
    module::{Module, ModuleId, OperationKey},
    operation::{
        Opcode, Operation, SpecialCase, SpecialCaseOp, StoreOpcode, UndefinedFunction, opcode,
        special_case, store_opcode,
    },
    param::{
        Argc, Complex, DefaultInt, DefaultTagMapper, IntConstant, IntReference, Optional, Overload2,
        Overload3, Overload4, Param, ParamList, RgbColour, RgbMaybeAColour, Rgba, Special,
        StrConstant, StrReference,
    },
};
