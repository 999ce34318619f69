// Prompt assembly: catalog + selection in, prompt text out.
// Everything below `handlers` is synchronous and side-effect free.

pub mod assembler;
pub mod format;
pub mod handlers;
pub mod lookup;
pub mod role;
pub mod selection;
pub mod template;
