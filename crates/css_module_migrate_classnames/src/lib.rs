//! Rewrites the values of className attributes so the classes a CSS module
//! defines are referenced through the module object instead of as global
//! strings.
//!
//! ```text
//! 'card bg-white'  ->  classNames(styles.card, "bg-white")
//! ```
//!
//! Only the `swc` expression of one attribute value is handled here. Finding
//! the attributes, naming the module object and splicing the result back into
//! the file is up to the caller.

use std::collections::HashMap;

pub mod boundary;
mod error;
mod nodes;
mod rewriter;
mod synthesize;
mod tokens;

pub use error::RewriteError;
pub use rewriter::{ClassArgs, ClassNameRewriter, FusedExpressionPolicy};
pub use synthesize::Replacement;
pub use tokens::{class_list, local_name, split_tokens};

/// Local class names exported by one CSS module, mapped to the class names
/// they compile to
pub type ClassNameMap = HashMap<String, String>;
