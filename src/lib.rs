pub mod cli;
pub mod error;
pub mod patterns;

pub use error::{CatalogError, CatalogResult};
pub use patterns::atm::{Atm, AtmError, MoneyPile};
pub use patterns::integer::ast::Expr;
pub use patterns::integer::context::Context;
pub use patterns::integer::visit::Visitor;
pub use patterns::integer::{EvalError, MAX_DEPTH, SyntaxError};
pub use patterns::{render_examples, run_examples};
