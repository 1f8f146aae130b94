use clap::{Parser, Subcommand, ValueEnum};
use lpp_lang::{Lpp, LppError, ProblemBlock};
use lpp_solver::{format_value, Solution, SolutionStatus, Solver, Step};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "lpp")]
#[command(about = "Solve linear programming problems with the tabular simplex method", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve every problem in a file
    Solve {
        /// The file containing one or more problems separated by blank lines
        file: PathBuf,
        /// Print the tableau and pivot choices at every iteration
        #[arg(short, long)]
        steps: bool,
        /// Output format
        #[arg(short, long, value_enum, default_value = "pretty")]
        format: Format,
        /// Give up after this many pivots
        #[arg(long, default_value_t = 10000)]
        max_iterations: usize,
        /// Values within this distance of zero are treated as zero
        #[arg(long, default_value_t = 1e-9)]
        tolerance: f64,
    },
    /// Parse every problem in a file and show its standard form
    Check {
        /// The file to check
        file: PathBuf,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Pretty,
    Json,
}

const RULE: &str = "==================================================";

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        std::process::exit(1);
    }

    let ok = match cli.command {
        Commands::Solve {
            file,
            steps,
            format,
            max_iterations,
            tolerance,
        } => {
            let solver = Solver::new()
                .with_max_iterations(max_iterations)
                .with_tolerance(tolerance)
                .with_trace(steps);
            tracing::info!(
                max_iterations = solver.max_iterations(),
                tolerance = solver.tolerance(),
                "Configured solver"
            );
            let blocks = read_blocks(&file);
            match format {
                Format::Pretty => solve_pretty(&blocks, &solver, steps),
                Format::Json => solve_json(&blocks, &solver),
            }
        }
        Commands::Check { file } => check(&read_blocks(&file)),
    };

    if !ok {
        std::process::exit(1);
    }
}

fn read_blocks(file: &Path) -> Vec<ProblemBlock> {
    let source = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            std::process::exit(1);
        }
    };
    let blocks = lpp_lang::read_problems(&source);
    tracing::info!(file = %file.display(), problems = blocks.len(), "Read input file");
    blocks
}

fn solve_block(block: &ProblemBlock, solver: &Solver) -> Result<(Lpp, Solution), LppError> {
    let lpp = Lpp::from_lines(&block.lines)?;
    let solution = lpp.solve(solver)?;
    Ok((lpp, solution))
}

fn solve_pretty(blocks: &[ProblemBlock], solver: &Solver, steps: bool) -> bool {
    let mut ok = true;
    for block in blocks {
        println!("\nProblem {}:", block.index);
        println!("{}", RULE);

        match solve_block(block, solver) {
            Ok((lpp, solution)) => {
                if steps {
                    for step in &solution.steps {
                        print_step(step, &lpp.problem.objective_variable);
                    }
                }
                print_report(&lpp, &solution);
            }
            Err(e) => {
                eprintln!("Problem {} (line {}): {}", block.index, block.line, e);
                ok = false;
            }
        }
    }
    ok
}

fn solve_json(blocks: &[ProblemBlock], solver: &Solver) -> bool {
    let mut ok = true;
    let results: Vec<serde_json::Value> = blocks
        .iter()
        .map(|block| match solve_block(block, solver) {
            Ok((lpp, solution)) => serde_json::json!({
                "index": block.index,
                "problem": lpp.to_string(),
                "solution": solution,
            }),
            Err(e) => {
                ok = false;
                serde_json::json!({
                    "index": block.index,
                    "line": block.line,
                    "error": e.to_string(),
                })
            }
        })
        .collect();

    match serde_json::to_string_pretty(&results) {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("Error serializing results: {}", e);
            ok = false;
        }
    }
    ok
}

fn check(blocks: &[ProblemBlock]) -> bool {
    let mut ok = true;
    for block in blocks {
        match Lpp::from_lines(&block.lines) {
            Ok(lpp) => {
                let problem = &lpp.problem;
                println!("✓ Problem {} (line {})", block.index, block.line);
                println!("  {}", lpp.objective);
                println!("  Variables: {}", problem.variables.join(", "));
                for (constraint, basic) in problem.constraints.iter().zip(problem.initial_basis()) {
                    let terms: Vec<String> = constraint
                        .equation
                        .coefficients
                        .iter()
                        .zip(&problem.variables)
                        .filter(|(c, _)| **c != 0.0)
                        .map(|(c, v)| format!("{}{}", format_value(*c), v))
                        .collect();
                    println!(
                        "  {} = {}    [basic: {}]",
                        terms.join(" + "),
                        format_value(constraint.rhs()),
                        basic.as_deref().unwrap_or("none")
                    );
                }
            }
            Err(e) => {
                eprintln!("✗ Problem {} (line {}): {}", block.index, block.line, e);
                ok = false;
            }
        }
    }
    ok
}

fn print_step(step: &Step, objective: &str) {
    println!("\nIteration {}:", step.iteration);
    println!("{}\n", RULE);
    println!("{}", step.tableau);

    println!("\nIntermediate Solution:");
    println!("\t{} = {:.2}", objective, step.objective_value);
    println!("Non-Basic Variables:");
    for name in step.tableau.variables() {
        if !step.tableau.is_basic(name) {
            println!("\t{} = 0", name);
        }
    }
    println!("Basic Variables:");
    for (i, name) in step.tableau.basis().iter().enumerate() {
        println!("\t{} = {:.2}", name, step.tableau.rhs(i + 1));
    }

    let Some(entering) = &step.entering else {
        return;
    };
    println!("\nEntering Variable: {}", entering);
    println!("Ratios:");
    for line in ratio_lines(step, entering) {
        println!("\t{}", line);
    }
    if let (Some(leaving), Some(pivot)) = (&step.leaving, step.pivot) {
        println!("Leaving Variable: {}", leaving);
        println!("Pivot Element: {:.4}", pivot);
    }
}

/// `rhs / entry = ratio` for every constraint row, read from the entering column
fn ratio_lines(step: &Step, entering: &str) -> Vec<String> {
    let Some(col) = step.tableau.column_of(entering) else {
        return Vec::new();
    };
    step.ratios
        .iter()
        .enumerate()
        .map(|(i, ratio)| {
            let (rhs, entry) = (step.tableau.rhs(i + 1), step.tableau.get(i + 1, col));
            match ratio {
                Some(r) => format!("{:.2} / {:.2} = {:.2}", rhs, entry, r),
                None => format!("{:.2} / {:.2} = -", rhs, entry),
            }
        })
        .collect()
}

fn print_assignments<'a>(assignments: impl Iterator<Item = (&'a str, f64)>) {
    for (name, value) in assignments {
        println!("\t{} = {:.2}", name, value);
    }
}

fn print_report(lpp: &Lpp, solution: &Solution) {
    println!("\n{}", RULE);
    println!("Solution:\n");
    println!("{}", lpp);

    let z = &lpp.problem.objective_variable;
    match solution.status {
        SolutionStatus::Optimal => {
            println!("\nThe above LPP is optimized at:");
            print_assignments(solution.assignments());
            println!("With Optimal Solution: {} = {}", z, format_value(solution.objective_value));
        }
        SolutionStatus::AlternateOptima => {
            println!("\nThe above LPP has Multiple Alternative Optimum Solutions.");
            println!("Two such solutions are:");
            println!("\nAlternative Solution 1:");
            print_assignments(solution.alternate_assignments());
            println!("With Optimal Solution: {} = {}", z, format_value(solution.objective_value));
            println!("\nAlternative Solution 2:");
            print_assignments(solution.assignments());
            println!("With Optimal Solution: {} = {}", z, format_value(solution.objective_value));

            let a: Vec<String> = solution.alternate_assignments().map(|(_, v)| format_value(v)).collect();
            let b: Vec<String> = solution.assignments().map(|(_, v)| format_value(v)).collect();
            println!("\nAll optimal solutions are convex combinations of the two above:");
            println!("\tLet A = [{}]", a.join(", "));
            println!("\tAnd B = [{}]", b.join(", "));
            println!("\tP = α1 * A + α2 * B, where α1 + α2 = 1 and α1, α2 >= 0");
        }
        SolutionStatus::Unbounded => {
            println!("\nThe above LPP has an Unbounded Feasible Region.");
            println!("The objective function's value can be improved without limit.");
        }
        SolutionStatus::Degenerate => {
            println!("\nThe above LPP is Degenerate.");
            println!(
                "A basic variable stayed at zero for two consecutive iterations; stopped after {} pivots at:",
                solution.iterations
            );
            print_assignments(solution.assignments());
            println!("With {} = {}", z, format_value(solution.objective_value));
        }
        SolutionStatus::NonConvergent => {
            println!("\nThe simplex method did not converge within {} iterations.", solution.iterations);
            println!("Last basic solution:");
            print_assignments(solution.assignments());
            println!("With {} = {}", z, format_value(solution.objective_value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn traced(lines: &[&str]) -> Solution {
        let lpp = Lpp::from_lines(lines).unwrap();
        lpp.solve(&Solver::new().with_trace(true)).unwrap()
    }

    #[test]
    fn test_ratio_lines_read_entering_column() {
        let solution = traced(&["Maximize: z = 5x1 + 4x2", "6x1 + 4x2 <= 24", "x1 + 2x2 <= 6"]);
        let first = &solution.steps[0];

        assert_eq!(
            ratio_lines(first, "x1"),
            vec!["24.00 / 6.00 = 4.00", "6.00 / 1.00 = 6.00"]
        );
    }

    #[test]
    fn test_ratio_lines_with_zero_rhs() {
        let solution = traced(&["Maximize: z = x1", "x1 <= 0"]);
        let first = &solution.steps[0];

        let lines = ratio_lines(first, "x1");
        assert_eq!(lines, vec!["0.00 / 1.00 = 0.00"]);
        assert!(lines.iter().all(|l| !l.contains("NaN")));
    }

    #[test]
    fn test_ratio_lines_skip_non_positive_entries() {
        let solution = traced(&["Maximize: z = x1", "x1 - x2 <= 1", "x2 <= 3"]);
        // second step: x2 enters with -1 in the x1 row
        let step = &solution.steps[1];
        assert_eq!(step.entering.as_deref(), Some("x2"));

        let lines = ratio_lines(step, "x2");
        assert_eq!(lines[0], "1.00 / -1.00 = -");
        assert_eq!(lines[1], "3.00 / 1.00 = 3.00");
    }
}
