//! Domain layer modules
//!
//! This module contains business domain logic:
//! - `template`: Email templates, their storage and token substitution

pub mod template;
