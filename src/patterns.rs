pub mod atm;
pub mod integer;

use atm::Atm;
use integer::ast;
use integer::context::Context;

use crate::error::CatalogResult;

// The two documented walkthroughs, as text
pub fn render_examples() -> CatalogResult<String> {
    let mut lines = Vec::new();

    let atm = Atm::standard();
    let chain = atm
        .piles()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ");
    lines.push(format!("Chain of responsibility, an ATM with piles {chain}:"));
    for amount in [310, 150] {
        lines.push(format!("withdraw({amount}) = {}", atm.withdraw(amount)));
    }

    let mut context = Context::new();
    context.assign("A", 2);
    context.assign("B", 1);
    context.assign("C", 3);
    let expr = ast::example();
    lines.push("Interpreter, with A = 2, B = 1, C = 3:".to_string());
    lines.push(format!("{expr} = {}", expr.evaluate(&context)?));

    Ok(lines.join("\n"))
}

pub fn run_examples() {
    match render_examples() {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("Error: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_examples() {
        let text = render_examples().unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Chain of responsibility, an ATM with piles 100x1 -> 50x2 -> 20x2 -> 10x6:",
                "withdraw(310) = false",
                "withdraw(150) = true",
                "Interpreter, with A = 2, B = 1, C = 3:",
                "A + (B + C) = 6",
            ]
        );
    }
}
