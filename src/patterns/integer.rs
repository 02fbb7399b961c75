// The interpreter pattern, over a very small integer language: named
// variables and addition. Expressions are immutable values. Copying and
// substitution always hand back fresh trees and never touch the receiver, so
// whether operands are shared or duplicated can't be observed.

use thiserror::Error;

/// Deepest tree that parsing and evaluation accept. Evaluation, printing,
/// cloning and substitution all recurse once per level.
pub const MAX_DEPTH: usize = 1_000;

#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum EvalError {
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),

    #[error("integer overflow while evaluating '{0}'")]
    Overflow(String),

    #[error("expression is {depth} levels deep, the limit is {limit}")]
    TooDeep { depth: usize, limit: usize },
}

#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum SyntaxError {
    #[error("syntax error at offset {offset} in '{input}'")]
    Invalid { input: String, offset: usize },

    #[error("expression has more than {limit} additions or nested parentheses")]
    TooLarge { limit: usize },
}

pub mod ast {
    #[derive(Debug, PartialEq, Eq, Clone)]
    pub enum Expr {
        Var(String),
        Add(Box<Expr>, Box<Expr>),
    }

    /// Any string is accepted as a name, but only `[A-Za-z_][A-Za-z0-9_]*`
    /// survives a trip through `pretty::print` and `parse::parse`.
    pub fn var(name: impl Into<String>) -> Expr {
        Expr::Var(name.into())
    }

    pub fn add(x: Expr, y: Expr) -> Expr {
        Expr::Add(Box::new(x), Box::new(y))
    }

    // A + (B + C)
    pub fn example() -> Expr {
        add(var("A"), add(var("B"), var("C")))
    }

    // Dropping a tree would otherwise recurse once per level, so a tree too
    // deep to evaluate could still blow the stack on its way out. Operands
    // that are additions get moved onto a heap stack and torn down there.
    impl Drop for Expr {
        fn drop(&mut self) {
            let mut pending = Vec::new();
            take_additions(self, &mut pending);
            while let Some(mut expr) = pending.pop() {
                take_additions(&mut expr, &mut pending);
            }
        }
    }

    fn take_additions(expr: &mut Expr, pending: &mut Vec<Expr>) {
        if let Expr::Add(x, y) = expr {
            for operand in [x, y] {
                if matches!(**operand, Expr::Add(..)) {
                    pending.push(std::mem::replace(&mut **operand, Expr::Var(String::new())));
                }
            }
        }
    }

    impl Expr {
        /// Levels in the tree, a lone variable being one. Walks with an
        /// explicit stack, so it is safe on trees of any depth.
        pub fn depth(&self) -> usize {
            let mut deepest = 0;
            let mut pending = vec![(self, 1)];
            while let Some((expr, depth)) = pending.pop() {
                deepest = deepest.max(depth);
                if let Expr::Add(x, y) = expr {
                    pending.push((x.as_ref(), depth + 1));
                    pending.push((y.as_ref(), depth + 1));
                }
            }
            deepest
        }

        /// A fresh tree with the same shape and names.
        pub fn copied(&self) -> Expr {
            self.clone()
        }

        /// Substitute `replacement` for every variable called `name`.
        pub fn replace(&self, name: &str, replacement: &Expr) -> Expr {
            match self {
                Expr::Var(own) if own == name => replacement.copied(),
                Expr::Var(_) => self.copied(),
                Expr::Add(x, y) => add(x.replace(name, replacement), y.replace(name, replacement)),
            }
        }
    }

}

pub mod context {
    use std::collections::BTreeMap;

    use super::EvalError;

    /// Values of the variables an expression is evaluated against.
    #[derive(Debug, Default, Clone, PartialEq, Eq)]
    pub struct Context {
        values: BTreeMap<String, i64>,
    }

    impl Context {
        pub fn new() -> Self {
            Self::default()
        }

        // Assigning twice overwrites.
        pub fn assign(&mut self, name: impl Into<String>, value: i64) {
            self.values.insert(name.into(), value);
        }

        pub fn lookup(&self, name: &str) -> Result<i64, EvalError> {
            self.values
                .get(name)
                .copied()
                .ok_or_else(|| EvalError::UndefinedVariable(name.to_string()))
        }

        pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
            self.values.iter().map(|(name, value)| (name.as_str(), *value))
        }
    }

    impl<K: Into<String>> FromIterator<(K, i64)> for Context {
        fn from_iter<T: IntoIterator<Item = (K, i64)>>(iter: T) -> Self {
            let mut context = Context::new();
            for (name, value) in iter {
                context.assign(name, value);
            }
            context
        }
    }

}

// Visitors get a default no-op for every node kind, so a visitor only spells
// out the nodes it cares about.
pub mod visit {
    use std::collections::BTreeSet;

    use super::ast::Expr;

    pub trait Visitor {
        fn visit_var(&mut self, _name: &str) {}

        fn visit_add(&mut self, _x: &Expr, _y: &Expr) {}
    }

    #[derive(Default)]
    struct Variables(BTreeSet<String>);

    impl Visitor for Variables {
        fn visit_var(&mut self, name: &str) {
            self.0.insert(name.to_string());
        }
    }

    impl Expr {
        /// Pre-order walk: a node is visited before its operands, left before right.
        pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) {
            match self {
                Expr::Var(name) => visitor.visit_var(name),
                Expr::Add(x, y) => {
                    visitor.visit_add(x, y);
                    x.accept(visitor);
                    y.accept(visitor);
                }
            }
        }

        pub fn variables(&self) -> BTreeSet<String> {
            let mut variables = Variables::default();
            self.accept(&mut variables);
            variables.0
        }
    }

    #[cfg(test)]
    mod tests {
        use super::super::ast::{add, example, var};
        use super::*;

        #[derive(Default)]
        struct Trace(Vec<String>);

        impl Visitor for Trace {
            fn visit_var(&mut self, name: &str) {
                self.0.push(name.to_string());
            }

            fn visit_add(&mut self, _x: &Expr, _y: &Expr) {
                self.0.push("+".to_string());
            }
        }

        #[test]
        fn test_pre_order() {
            let mut trace = Trace::default();
            example().accept(&mut trace);
            assert_eq!(trace.0, vec!["+", "A", "+", "B", "C"]);
        }

        #[test]
        fn test_variables_are_deduplicated() {
            let expr = add(var("B"), add(var("A"), var("B")));
            assert_eq!(
                expr.variables().into_iter().collect::<Vec<_>>(),
                vec!["A".to_string(), "B".to_string()]
            );
        }

        #[test]
        fn test_visitor_without_overrides_is_a_no_op() {
            struct Nothing;
            impl Visitor for Nothing {}
            example().accept(&mut Nothing);
        }
    }
}

// Our evaluator is the host language itself, with the one concession that
// overflow is an error instead of a panic.
pub mod interpreter {
    use tracing::trace;

    use super::ast::Expr;
    use super::context::Context;
    use super::{EvalError, MAX_DEPTH};

    impl Expr {
        /// Operands are evaluated left to right, so the first missing variable
        /// in reading order is the one reported. Trees deeper than `MAX_DEPTH`
        /// are refused up front.
        pub fn evaluate(&self, context: &Context) -> Result<i64, EvalError> {
            let depth = self.depth();
            if depth > MAX_DEPTH {
                return Err(EvalError::TooDeep {
                    depth,
                    limit: MAX_DEPTH,
                });
            }
            self.evaluate_unchecked(context)
        }

        fn evaluate_unchecked(&self, context: &Context) -> Result<i64, EvalError> {
            match self {
                Expr::Var(name) => {
                    let value = context.lookup(name)?;
                    trace!(name = %name, value, "lookup");
                    Ok(value)
                }
                Expr::Add(x, y) => {
                    let x = x.evaluate_unchecked(context)?;
                    let y = y.evaluate_unchecked(context)?;
                    x.checked_add(y)
                        .ok_or_else(|| EvalError::Overflow(self.to_string()))
                }
            }
        }
    }

}

// Tokens consume trailing whitespace, so the input is always left on the next
// token.
pub mod lex {
    use winnow::Parser;
    use winnow::combinator;
    use winnow::error::ErrMode;
    use winnow::token;

    pub fn ws<'a>(input: &mut &'a str) -> Result<&'a str, ErrMode<()>> {
        token::take_while(0.., |c: char| c.is_whitespace()).parse_next(input)
    }

    pub fn lex_ws<'a, F, O>(inner: F) -> impl Parser<&'a str, O, ErrMode<()>>
    where
        F: Parser<&'a str, O, ErrMode<()>>,
    {
        combinator::terminated(inner, ws)
    }

    pub fn lparen<'a>(input: &mut &'a str) -> Result<char, ErrMode<()>> {
        lex_ws('(').parse_next(input)
    }

    pub fn rparen<'a>(input: &mut &'a str) -> Result<char, ErrMode<()>> {
        lex_ws(')').parse_next(input)
    }

    pub fn add<'a>(input: &mut &'a str) -> Result<char, ErrMode<()>> {
        lex_ws('+').parse_next(input)
    }

    // A letter or underscore, then any number of letters, digits and
    // underscores.
    pub fn ident<'a>(input: &mut &'a str) -> Result<&'a str, ErrMode<()>> {
        lex_ws(Parser::take((
            token::one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
            token::take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
        )))
        .parse_next(input)
    }

}

// The grammar is left-associative addition over parenthesized expressions and
// variables:
//
// <expr> ->
//     <atom> ('+' <atom>)*
//
// <atom> ->
//     '(' <expr> ')'
//     <ident>
//
// Repetition rather than left recursion keeps recursive descent from looping
// forever on the first <expr>.
pub mod parse {
    use winnow::error::ErrMode;
    use winnow::{Parser, combinator};

    use super::ast::{self, Expr};
    use super::lex;
    use super::{MAX_DEPTH, SyntaxError};

    pub fn var<'a>(input: &mut &'a str) -> Result<Expr, ErrMode<()>> {
        lex::ident.map(|name: &str| ast::var(name)).parse_next(input)
    }

    pub fn parenthetical<'a>(input: &mut &'a str) -> Result<Expr, ErrMode<()>> {
        combinator::delimited(lex::lparen, expr, lex::rparen).parse_next(input)
    }

    pub fn atom<'a>(input: &mut &'a str) -> Result<Expr, ErrMode<()>> {
        combinator::alt((parenthetical, var)).parse_next(input)
    }

    pub fn expr<'a>(input: &mut &'a str) -> Result<Expr, ErrMode<()>> {
        (
            atom,
            combinator::repeat::<_, _, Vec<Expr>, _, _>(
                0..,
                combinator::preceded(lex::add, atom),
            ),
        )
            .map(|(first, rest)| rest.into_iter().fold(first, ast::add))
            .parse_next(input)
    }

    // A tree is at most one level deeper than it has additions, and the
    // parser itself recurses once per open parenthesis. Checking both on the
    // raw text keeps an oversized tree from ever being built.
    fn check_size(input: &str) -> Result<(), SyntaxError> {
        let additions = input.matches('+').count();
        let mut open = 0usize;
        let mut deepest = 0;
        for c in input.chars() {
            match c {
                '(' => {
                    open += 1;
                    deepest = deepest.max(open);
                }
                ')' => open = open.saturating_sub(1),
                _ => {}
            }
        }
        if additions >= MAX_DEPTH || deepest > MAX_DEPTH {
            return Err(SyntaxError::TooLarge { limit: MAX_DEPTH });
        }
        Ok(())
    }

    pub fn parse(input: &str) -> Result<Expr, SyntaxError> {
        check_size(input)?;
        combinator::preceded(lex::ws, expr)
            .parse(input)
            .map_err(|e| SyntaxError::Invalid {
                input: input.to_string(),
                offset: e.offset(),
            })
    }

}

// Prints with as few parentheses as the left-associative parser needs to read
// the same tree back: only an addition in the right operand gets wrapped.
pub mod pretty {
    use std::fmt;

    use super::ast::Expr;

    fn append(acc: &mut String, expr: &Expr) {
        match expr {
            Expr::Var(name) => acc.push_str(name),
            Expr::Add(x, y) => {
                append(acc, x);
                acc.push_str(" + ");
                match y.as_ref() {
                    Expr::Add(..) => {
                        acc.push('(');
                        append(acc, y);
                        acc.push(')');
                    }
                    Expr::Var(_) => append(acc, y),
                }
            }
        }
    }

    /// Names are written out verbatim. The result parses back to `expr` only
    /// when every name is an identifier the lexer accepts.
    pub fn print(expr: &Expr) -> String {
        let mut acc = String::new();
        append(&mut acc, expr);
        acc
    }

    impl fmt::Display for Expr {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&print(self))
        }
    }

}
