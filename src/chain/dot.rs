// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Graphviz rendering of a build graph.
//!
//! Start steps share the first rank and end steps the last, so the output
//! reads left to right from what runs first to what finishes the build.
//! Each edge is labelled with the items it carries.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;

use crate::chain::BuildGraph;

impl BuildGraph {
    pub fn to_dot(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = self.write_dot(&mut out);
        out
    }

    fn write_dot(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "digraph {{")?;
        writeln!(out, "    node [shape=rectangle];")?;
        writeln!(out, "    rankdir=LR;")?;
        writeln!(out)?;

        let start = self.start_steps();
        write!(out, "    {{ rank = same; ")?;
        for step in &start {
            write!(out, "{}; ", quote(step))?;
        }
        writeln!(out, "}};")?;

        write!(out, "    {{ rank = same; ")?;
        for step in self.end_steps().iter().filter(|s| !start.contains(*s)) {
            write!(out, "{}; ", quote(step))?;
        }
        writeln!(out, "}};")?;
        writeln!(out)?;

        for (index, node) in self.nodes().iter().enumerate() {
            if node.dependencies.is_empty() && node.dependents.is_empty() {
                writeln!(out, "    {};", quote(&node.descriptor.name))?;
            }
            for &dependent in &node.dependents {
                let label = self
                    .edge_items(index, dependent)
                    .iter()
                    .map(|item| item.short_name())
                    .collect::<Vec<_>>()
                    .join(", ");
                writeln!(
                    out,
                    "    {} -> {} [label={}];",
                    quote(&node.descriptor.name),
                    quote(&self.nodes()[dependent].descriptor.name),
                    quote(&label)
                )?;
            }
        }

        writeln!(out, "}}")
    }

    /// Write [`to_dot`](Self::to_dot) output to a file, creating parent directories
    pub fn write_dot_file(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_dot())
    }
}

fn quote(input: &str) -> String {
    let mut quoted = String::with_capacity(input.len() + 2);
    quoted.push('"');
    for c in input.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::BuildChainBuilder;

    struct Sources;
    struct Classes;
    struct Docs;

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote(r#"say "hi""#), r#""say \"hi\"""#);
        assert_eq!(quote(r"a\b"), r#""a\\b""#);
    }

    #[test]
    fn test_dot_output_lists_ranks_and_labelled_edges() {
        let mut builder = BuildChainBuilder::new();
        builder
            .add_step_fn("scan", |_ctx| Ok(()))
            .produces::<Sources>()
            .register();
        builder
            .add_step_fn("compile", |_ctx| Ok(()))
            .consumes::<Sources>()
            .produces::<Classes>()
            .register();
        builder
            .add_step_fn("docs", |_ctx| Ok(()))
            .produces::<Docs>()
            .register();

        let dot = builder.build_graph().unwrap().to_dot();
        assert!(dot.starts_with("digraph {"));
        assert!(dot.contains(r#"{ rank = same; "scan"; "docs"; };"#));
        assert!(dot.contains(r#"{ rank = same; "compile"; };"#));
        assert!(dot.contains(r#""scan" -> "compile" [label="Sources"];"#));
        assert!(dot.contains(r#"    "docs";"#));
        assert!(dot.trim_end().ends_with('}'));
    }

    #[test]
    fn test_write_dot_file_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("graph.dot");

        let mut builder = BuildChainBuilder::new();
        builder
            .add_step_fn("only", |_ctx| Ok(()))
            .produces::<Docs>()
            .register();
        builder.build_graph().unwrap().write_dot_file(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains(r#""only""#));
    }
}
