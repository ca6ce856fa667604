//! Builds the Bayes tree of a chain or grid model and prints its shape.
//!
//! Run with:
//! ```bash
//! cargo run --example clique_stats -- grid 5
//! cargo run --example clique_stats -- chain 20 --print-tree
//! ```

use clap::{Parser, ValueEnum};
use log::info;

use jtree_rs::etree::EliminationTree;
use jtree_rs::factor::GraphFactor;
use jtree_rs::junction::JunctionTree;
use jtree_rs::symbolic::{eliminate_symbolic_factors, SymbolicConditional, SymbolicFactor};
use jtree_rs::types::Key;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Model {
    /// x1 - x2 - ... - xn
    Chain,
    /// n x n grid with 4-neighbourhood
    Grid,
}

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Model to build.
    #[arg(value_enum, default_value = "grid")]
    model: Model,

    /// Model size.
    #[arg(value_name = "INT", default_value = "4")]
    n: u64,

    /// Number of values of each variable, for the table size estimate.
    #[arg(long, value_name = "INT", default_value = "2")]
    cardinality: u64,

    /// Print the junction tree and the Bayes tree.
    #[arg(long)]
    print_tree: bool,

    /// Eliminate in parallel.
    #[cfg(feature = "parallel")]
    #[arg(long)]
    parallel: bool,
}

type Graph = Vec<GraphFactor<SymbolicFactor, SymbolicConditional>>;

fn chain(n: u64) -> (Graph, Vec<Key>) {
    let mut factors = vec![GraphFactor::new(SymbolicFactor::from_ids([0]))];
    for k in 1..n {
        factors.push(GraphFactor::new(SymbolicFactor::from_ids([k - 1, k])));
    }
    (factors, (0..n).map(Key::new).collect())
}

fn grid(n: u64) -> (Graph, Vec<Key>) {
    let mut factors = Vec::new();
    for r in 0..n {
        for c in 0..n {
            let k = r * n + c;
            factors.push(GraphFactor::new(SymbolicFactor::from_ids([k])));
            if c + 1 < n {
                factors.push(GraphFactor::new(SymbolicFactor::from_ids([k, k + 1])));
            }
            if r + 1 < n {
                factors.push(GraphFactor::new(SymbolicFactor::from_ids([k, k + n])));
            }
        }
    }
    (factors, (0..n * n).map(Key::new).collect())
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);

    let (factors, ordering) = match args.model {
        Model::Chain => chain(args.n),
        Model::Grid => grid(args.n),
    };
    info!("{} factors over {} variables", factors.len(), ordering.len());

    let time_build = std::time::Instant::now();
    let etree = EliminationTree::build(&factors, &ordering)?;
    let jtree = JunctionTree::from_elimination_tree(&etree);
    info!(
        "junction tree: {} clusters (from {} nodes), max problem size {}, in {:.3}s",
        jtree.num_clusters(),
        etree.len(),
        jtree.max_problem_size(),
        time_build.elapsed().as_secs_f64()
    );
    if args.print_tree {
        println!("Junction tree:\n{}", jtree);
    }

    let time_eliminate = std::time::Instant::now();
    #[cfg(feature = "parallel")]
    let result = if args.parallel {
        let config = jtree_rs::eliminate::ParallelConfig::default();
        jtree.eliminate_parallel(eliminate_symbolic_factors, &config)
    } else {
        jtree.eliminate(eliminate_symbolic_factors)
    };
    #[cfg(not(feature = "parallel"))]
    let result = jtree.eliminate(eliminate_symbolic_factors);
    let (bayes_tree, remaining) = result?;
    info!(
        "eliminated in {:.3}s, {} remaining factors",
        time_eliminate.elapsed().as_secs_f64(),
        remaining.len()
    );
    if args.print_tree {
        println!("Bayes tree:\n{}", bayes_tree);
    }

    println!("{}", bayes_tree.stats());
    let cardinality = args.cardinality;
    println!("table size:         {}", bayes_tree.table_size(|_| cardinality));

    println!("Total time: {:.3} s", time_total.elapsed().as_secs_f64());
    Ok(())
}
