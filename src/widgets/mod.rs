pub mod base;
pub mod dialog;
pub mod inputs;
pub mod traits;
pub mod validators;

pub use base::FieldBase;
pub use dialog::{ClosePolicy, DialogBridge, DialogPhase, KeyboardInset};
pub use traits::{
    DrawOutput, Drawable, FieldEditor, FieldInput, FieldKind, InteractionResult, RenderContext,
    ValidationMode,
};
