//! The `check` CLI subcommand.

use clap::Parser;
use itertools::Itertools;
use std::path::PathBuf;

use crate::graph::VType;
use crate::json::read_diagram;

use super::CliError;

/// Print a summary of a diagram and check its paths.
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Json file holding the diagram.
    input: PathBuf,
}

impl CheckArgs {
    /// Run the `check` command using the provided arguments.
    pub fn run(self) -> Result<(), CliError> {
        let (g, names) = read_diagram(&self.input)?;
        println!("nodes: {}", g.num_vertices());
        println!("edges: {}", g.num_edges());
        println!("paths: {}", g.num_paths());

        let mut invalid = 0;
        for (name, &p) in names.paths.iter().sorted() {
            let Some(es) = g.path(p) else {
                continue;
            };
            let walk = g
                .path_vertices(p)
                .unwrap_or_default()
                .into_iter()
                .map(|v| names.vertex_name(v).unwrap_or("?"))
                .join(" -> ");
            match g.sort_valid_path_edges(es, true) {
                Ok(_) => println!("path {name}: {walk}"),
                Err(err) => {
                    println!("path {name}: {err}");
                    invalid += 1;
                }
            }
        }

        for v in g.vertices() {
            if g.vertex_type(v) == Some(VType::TempPivot) {
                let name = names.vertex_name(v).unwrap_or("?");
                println!("node {name} is an unfinished reverse pivot");
            }
        }

        match invalid {
            0 => Ok(()),
            n => Err(CliError::InvalidPaths(n)),
        }
    }
}
