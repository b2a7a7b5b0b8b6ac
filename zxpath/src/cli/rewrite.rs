//! The `rewrite` CLI subcommand.

use clap::{Parser, Subcommand, ValueEnum};
use itertools::Itertools;
use log::info;
use std::path::PathBuf;

use crate::angle::Angle;
use crate::graph::{EdgeId, VType, VertexId};
use crate::json::{encode_diagram, read_diagram, write_diagram, DiagramNames};
use crate::ops::GraphOps;
use crate::rules::{Outcome, Partition, Rewrite};

use super::CliError;

/// Dry-run or apply a rewrite rule.
///
/// Nodes and edges are named as in the input file. The rewritten diagram
/// names every item after its id, and the summary printed after a rewrite
/// uses the same names.
#[derive(Parser, Debug)]
pub struct RewriteArgs {
    /// Json file holding the diagram.
    input: PathBuf,

    /// Output to a file instead of printing the result.
    #[arg(long, short)]
    out: Option<PathBuf>,

    /// Only check whether the rule applies.
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    rule: RuleArgs,
}

/// The rule to run.
#[derive(Subcommand, Debug)]
pub enum RuleArgs {
    /// Replace an edge by two spiders joined with Hadamard edges.
    ExpandHadamard {
        edge: String,
        /// Color of the new spiders.
        #[arg(long, value_enum, default_value_t = Color::Z)]
        color: Color,
    },
    /// Remove a phase-free degree-2 spider and merge its neighbors.
    Fuse {
        vertex: String,
        /// Keep the neighbor across this edge in place.
        #[arg(long)]
        starting_edge: Option<String>,
    },
    /// Remove a Hadamard edge by fusing the spider at one of its ends.
    CancelHadamard { edge: String },
    /// Split a spider in two, moving some of its edges to the copy.
    Split {
        /// The spider to split. Inferred from the edges when left out.
        #[arg(long)]
        vertex: Option<String>,
        /// Edges to move to the copy.
        #[arg(long, value_delimiter = ',', conflicts_with_all = ["by_position", "gadget"])]
        edges: Vec<String>,
        /// Move the edges pointing away from the two closest neighbors.
        #[arg(long, conflicts_with = "gadget")]
        by_position: bool,
        /// Split off a phase gadget, moving no edges.
        #[arg(long)]
        gadget: bool,
        /// Phase given to the copy.
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        left_phase: Angle,
        /// Color of the spider joining the copy to the original.
        #[arg(long, value_enum, default_value_t = Color::X)]
        color: Color,
    },
    /// Local complementation about a spider.
    LocalComp { vertex: String },
    /// Undo a local complementation over a set of spiders.
    RevLocalComp {
        #[arg(required = true)]
        vertices: Vec<String>,
        /// Phase of the restored spider.
        #[arg(long, default_value = "π/2", allow_hyphen_values = true)]
        phase: Angle,
    },
    /// Pivot about a Hadamard edge.
    Pivot { edge: String },
    /// Undo a pivot, restoring two joined spiders with the given neighbors.
    RevPivot {
        /// Neighbors of the first restored spider.
        #[arg(long, value_delimiter = ',', required = true)]
        u_side: Vec<String>,
        /// Neighbors of the second restored spider.
        #[arg(long, value_delimiter = ',', required = true)]
        v_side: Vec<String>,
        /// Phase of the first restored spider.
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        phase_u: Angle,
        /// Phase of the second restored spider.
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        phase_v: Angle,
    },
}

/// Spider colors.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Z,
    X,
}

impl From<Color> for VType {
    fn from(c: Color) -> VType {
        match c {
            Color::Z => VType::Z,
            Color::X => VType::X,
        }
    }
}

impl RewriteArgs {
    /// Run the `rewrite` command using the provided arguments.
    pub fn run(self) -> Result<(), CliError> {
        let (mut g, names) = read_diagram(&self.input)?;
        let steps = self.rule.to_rewrites(&names)?;

        let mut summary = Vec::new();
        if self.dry_run {
            // later steps are tried on a scratch copy holding the earlier ones
            let mut scratch = g.clone();
            for step in steps.iter() {
                let applies = step.resolve(&summary)?.is_valid(&scratch);
                let verdict = if applies { "applies" } else { "does not apply" };
                println!("{}: {verdict}", step.name());
                if !applies {
                    return Ok(());
                }
                let outcome = step.resolve(&summary)?.apply(&mut GraphOps::new(&mut scratch))?;
                summary.push(outcome);
            }
            return Ok(());
        }

        for step in steps.iter() {
            let rw = step.resolve(&summary)?;
            let outcome = rw.apply(&mut GraphOps::new(&mut g))?;
            info!("applied {}: {}", rw.name(), describe(&outcome));
            summary.push(outcome);
        }

        if let Some(out_path) = self.out {
            write_diagram(&g, &out_path)?;
            for (step, outcome) in steps.iter().zip(&summary) {
                println!("{}: {}", step.name(), describe(outcome));
            }
        } else {
            println!("{}", encode_diagram(&g)?);
        }
        Ok(())
    }
}

/// A rewrite to run, possibly waiting on the hub created by an earlier step.
#[derive(Debug, Clone)]
enum Step {
    Ready(Rewrite),
    FinishPivot {
        vertices: Vec<VertexId>,
        phase_u: Angle,
        phase_v: Angle,
    },
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Step::Ready(rw) => rw.name(),
            Step::FinishPivot { .. } => "reverse_pivot_finish",
        }
    }

    /// The rewrite for this step, given the outcomes of the steps before it.
    fn resolve(&self, done: &[Outcome]) -> Result<Rewrite, CliError> {
        match self {
            Step::Ready(rw) => Ok(rw.clone()),
            Step::FinishPivot {
                vertices,
                phase_u,
                phase_v,
            } => {
                let hub = done
                    .iter()
                    .rev()
                    .find_map(|o| match o {
                        Outcome::Hub(h) => Some(*h),
                        _ => None,
                    })
                    .ok_or(CliError::MissingHub(self.name()))?;
                Ok(Rewrite::ReversePivotFinish {
                    hub,
                    vertices: vertices.clone(),
                    phase_u: phase_u.clone(),
                    phase_v: phase_v.clone(),
                })
            }
        }
    }
}

impl RuleArgs {
    fn to_rewrites(&self, names: &DiagramNames) -> Result<Vec<Step>, CliError> {
        let rw = match self {
            RuleArgs::ExpandHadamard { edge: e, color } => Rewrite::ExpandHadamardEdge {
                edge: edge(names, e)?,
                color: (*color).into(),
            },
            RuleArgs::Fuse {
                vertex: v,
                starting_edge,
            } => Rewrite::FuseDegree2Spider {
                vertex: node(names, v)?,
                starting_edge: starting_edge
                    .as_deref()
                    .map(|e| edge(names, e))
                    .transpose()?,
            },
            RuleArgs::CancelHadamard { edge: e } => Rewrite::CancelHadamardEdge {
                edge: edge(names, e)?,
            },
            RuleArgs::Split {
                vertex: v,
                edges,
                by_position,
                gadget,
                left_phase,
                color,
            } => {
                let partition = if *gadget {
                    Partition::Gadget
                } else if *by_position {
                    Partition::ByPosition
                } else {
                    let es = edges
                        .iter()
                        .map(|n| edge(names, n))
                        .collect::<Result<Vec<EdgeId>, _>>()?;
                    Partition::Edges(es)
                };
                Rewrite::SplitSpider {
                    vertex: v.as_deref().map(|v| node(names, v)).transpose()?,
                    partition,
                    left_phase: left_phase.clone(),
                    new_color: (*color).into(),
                }
            }
            RuleArgs::LocalComp { vertex: v } => Rewrite::LocalComp {
                vertex: node(names, v)?,
            },
            RuleArgs::RevLocalComp { vertices: vs, phase } => Rewrite::ReverseLocalComp {
                vertices: nodes(names, vs)?,
                phase: phase.clone(),
            },
            RuleArgs::Pivot { edge: e } => Rewrite::Pivot {
                edge: edge(names, e)?,
            },
            RuleArgs::RevPivot {
                u_side,
                v_side,
                phase_u,
                phase_v,
            } => {
                return Ok(vec![
                    Step::Ready(Rewrite::ReversePivotStart {
                        vertices: nodes(names, u_side)?,
                    }),
                    Step::FinishPivot {
                        vertices: nodes(names, v_side)?,
                        phase_u: phase_u.clone(),
                        phase_v: phase_v.clone(),
                    },
                ]);
            }
        };
        Ok(vec![Step::Ready(rw)])
    }
}

fn node(names: &DiagramNames, name: &str) -> Result<VertexId, CliError> {
    names
        .vertex(name)
        .ok_or_else(|| CliError::UnknownName("node", name.to_string()))
}

fn nodes(names: &DiagramNames, list: &[String]) -> Result<Vec<VertexId>, CliError> {
    list.iter().map(|n| node(names, n)).collect()
}

fn edge(names: &DiagramNames, name: &str) -> Result<EdgeId, CliError> {
    names
        .edge(name)
        .ok_or_else(|| CliError::UnknownName("edge", name.to_string()))
}

/// A one-line summary of what a rewrite did.
fn describe(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Expanded(sub) => format!(
            "added nodes {} and edges {}",
            sub.vertices.iter().join(", "),
            sub.edges.iter().join(", ")
        ),
        Outcome::Fused(v) => format!("merged into {v}"),
        Outcome::Split(s) => format!("split off {} joined through {}", s.split, s.middle),
        Outcome::Complemented(vs) => format!("complemented {}", vs.iter().join(", ")),
        Outcome::Hub(v) => format!("added {v}"),
        Outcome::Pivoted(r) => format!(
            "groups [{}] [{}] [{}]",
            r.a.iter().join(", "),
            r.b.iter().join(", "),
            r.c.iter().join(", ")
        ),
        Outcome::Unpivoted(u, v) => format!("restored {u} and {v}"),
        Outcome::Abandoned => "removed the hub".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(args: &[&str]) -> RewriteArgs {
        let mut full = vec!["rewrite", "diagram.json"];
        full.extend_from_slice(args);
        RewriteArgs::try_parse_from(full).unwrap()
    }

    fn names() -> DiagramNames {
        let mut names = DiagramNames::default();
        for (i, n) in ["a", "b", "c"].iter().enumerate() {
            names.nodes.insert(n.to_string(), VertexId(i as u32));
        }
        names.edges.insert("ab".to_string(), EdgeId(0));
        names
    }

    #[rstest]
    #[case::expand(&["expand-hadamard", "ab", "--color", "x"], "expand_hadamard_edge")]
    #[case::fuse(&["fuse", "b", "--starting-edge", "ab"], "fuse_degree2_spider")]
    #[case::split(&["split", "--edges", "ab", "--left-phase", "-π/2"], "split_spider")]
    #[case::rev_lc(&["rev-local-comp", "a", "b", "--phase", "-π/2"], "reverse_local_comp")]
    #[case::pivot(&["pivot", "ab"], "pivot")]
    fn rules_by_name(#[case] args: &[&str], #[case] name: &str) {
        let steps = parse(args).rule.to_rewrites(&names()).unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].name(), name);
    }

    #[test]
    fn rev_pivot_takes_two_steps() {
        let args = ["rev-pivot", "--u-side", "a,b", "--v-side", "a,c", "--phase-v", "π"];
        let steps = parse(&args).rule
            .to_rewrites(&names())
            .unwrap();
        assert_eq!(
            steps[0].resolve(&[]).unwrap(),
            Rewrite::ReversePivotStart {
                vertices: vec![VertexId(0), VertexId(1)]
            }
        );
        assert!(matches!(
            steps[1].resolve(&[]),
            Err(CliError::MissingHub("reverse_pivot_finish"))
        ));
        let finish = steps[1].resolve(&[Outcome::Hub(VertexId(7))]).unwrap();
        assert_eq!(
            finish,
            Rewrite::ReversePivotFinish {
                hub: VertexId(7),
                vertices: vec![VertexId(0), VertexId(2)],
                phase_u: Angle::zero(),
                phase_v: Angle::pi(),
            }
        );
    }

    #[test]
    fn unknown_names() {
        let err = parse(&["local-comp", "z"])
            .rule
            .to_rewrites(&names())
            .unwrap_err();
        assert_eq!(err.to_string(), "No node named \"z\"");
    }

    #[test]
    fn describe_outcomes() {
        assert_eq!(describe(&Outcome::Fused(VertexId(3))), "merged into v3");
        assert_eq!(
            describe(&Outcome::Complemented(vec![VertexId(1), VertexId(2)])),
            "complemented v1, v2"
        );
    }
}
