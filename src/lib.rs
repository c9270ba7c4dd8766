//! calli - lowering of indirect-call intrinsics to CIL
//!
//! Declarations named `CallIndirect*` or `TailCallIndirect*` get a
//! hand-written body that loads every argument and performs a `calli`
//! with the calling convention named by the suffix.

pub mod config;
pub mod decl;
pub mod error;
pub mod il;
pub mod intrinsic;
pub mod module;

// Re-export commonly used types
pub use config::{LowerConfig, OptimizationLevel, OutputFormat};
pub use error::LowerError;
pub use intrinsic::{
    CallingConvention, FunctionSignature, IntrinsicKind, assemble_intrinsic, classify,
    convention_of, lower_intrinsic,
};
pub use module::{MethodBody, MethodId, ModuleBuilder, SignatureSlot};
