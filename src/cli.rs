//! Command line driver for the catalog

use clap::{ArgAction, Parser, Subcommand};
use tracing::{debug, info, instrument};

use crate::error::{CatalogError, CatalogResult};
use crate::patterns::atm::{Atm, MoneyPile};
use crate::patterns::integer::ast::Expr;
use crate::patterns::integer::context::Context;
use crate::patterns::integer::{EvalError, MAX_DEPTH, parse};
use crate::patterns::render_examples;

/// Runs the chain-of-responsibility ATM and the integer interpreter
#[derive(Parser, Debug)]
#[command(name = "pattern-catalog")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Raise log verbosity (-d info, -dd debug, -ddd trace); RUST_LOG wins if set
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the documented walkthroughs (the default)
    Demo,

    /// Ask an ATM for an amount
    Withdraw {
        #[arg(allow_negative_numbers = true)]
        amount: i64,

        /// A pile of bills, head of the chain first (default: 100x1 50x2 20x2 10x6)
        #[arg(long = "pile", value_name = "VALUExCOUNT")]
        piles: Vec<MoneyPile>,
    },

    /// Evaluate an expression such as "A + (B + C)"
    Eval {
        expr: String,

        /// Variable value
        #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        vars: Vec<(String, i64)>,

        /// Substitute an expression for a variable before evaluating, applied in order
        #[arg(long, value_name = "NAME=EXPR", value_parser = parse_replacement)]
        replace: Vec<(String, Expr)>,
    },
}

/// What a command printed, and whether it got what it asked for.
#[derive(Debug, PartialEq, Eq)]
pub struct Outcome {
    pub output: String,
    pub success: bool,
}

fn split_pair(s: &str) -> Result<(&str, &str), String> {
    s.split_once('=')
        .map(|(name, rest)| (name.trim(), rest.trim()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected NAME=..., got '{s}'"))
}

fn parse_assignment(s: &str) -> Result<(String, i64), String> {
    let (name, value) = split_pair(s)?;
    let value = value
        .parse::<i64>()
        .map_err(|e| format!("invalid value for '{name}': {e}"))?;
    Ok((name.to_string(), value))
}

fn parse_replacement(s: &str) -> Result<(String, Expr), String> {
    let (name, expr) = split_pair(s)?;
    let expr = parse::parse(expr).map_err(|e| e.to_string())?;
    Ok((name.to_string(), expr))
}

pub fn execute(cli: &Cli) -> CatalogResult<Outcome> {
    match &cli.command {
        None | Some(Commands::Demo) => Ok(Outcome {
            output: render_examples()?,
            success: true,
        }),
        Some(Commands::Withdraw { amount, piles }) => withdraw(*amount, piles),
        Some(Commands::Eval {
            expr,
            vars,
            replace,
        }) => eval(expr, vars, replace),
    }
}

#[instrument(level = "info", skip(piles))]
fn withdraw(amount: i64, piles: &[MoneyPile]) -> CatalogResult<Outcome> {
    let atm = if piles.is_empty() {
        Atm::standard()
    } else {
        Atm::new(piles.to_vec())?
    };
    let success = atm.withdraw(amount);
    info!(amount, success, "withdrawal finished");
    Ok(Outcome {
        output: format!("withdraw({amount}) = {success}"),
        success,
    })
}

#[instrument(level = "info", skip_all, fields(source = %source))]
fn eval(source: &str, vars: &[(String, i64)], replace: &[(String, Expr)]) -> CatalogResult<Outcome> {
    if source.trim().is_empty() {
        return Err(CatalogError::InvalidArgs("empty expression".to_string()));
    }
    let mut expr = parse::parse(source)?;
    for (name, replacement) in replace {
        expr = expr.replace(name, replacement);
        // Each substitution can add up to a whole replacement's depth.
        let depth = expr.depth();
        if depth > MAX_DEPTH {
            return Err(EvalError::TooDeep {
                depth,
                limit: MAX_DEPTH,
            }
            .into());
        }
        debug!(name = %name, expr = %expr, "substituted");
    }
    debug!(variables = ?expr.variables(), "free variables");
    let context: Context = vars.iter().map(|(name, value)| (name.as_str(), *value)).collect();
    for (name, value) in context.iter() {
        debug!(name, value, "variable");
    }
    let value = expr.evaluate(&context)?;
    Ok(Outcome {
        output: format!("{expr} = {value}"),
        success: true,
    })
}
