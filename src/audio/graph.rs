use std::collections::HashSet;
use std::fmt::Write as _;

use crate::foundation::error::{ChatReelError, ChatReelResult};

/// One filter option: `key=value`, or a bare positional value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterParam {
    /// Option name; `None` for positional values.
    pub key: Option<String>,
    /// Option value.
    pub value: String,
}

/// One filter instance with labelled inputs and outputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterNode {
    /// Input pad labels: stream specifiers such as `1:a`, or outputs of earlier nodes.
    pub inputs: Vec<String>,
    /// Filter name (`adelay`, `amix`, ...).
    pub filter: String,
    /// Options in order.
    pub params: Vec<FilterParam>,
    /// Output pad labels.
    pub outputs: Vec<String>,
}

impl FilterNode {
    /// Node running `filter` with no pads or options yet.
    pub fn new(filter: impl Into<String>) -> Self {
        Self {
            inputs: Vec::new(),
            filter: filter.into(),
            params: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Add an input pad.
    pub fn input(mut self, label: impl Into<String>) -> Self {
        self.inputs.push(label.into());
        self
    }

    /// Add an output pad.
    pub fn output(mut self, label: impl Into<String>) -> Self {
        self.outputs.push(label.into());
        self
    }

    /// Add a `key=value` option.
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push(FilterParam {
            key: Some(key.into()),
            value: value.to_string(),
        });
        self
    }

    /// Add a positional option.
    pub fn positional(mut self, value: impl ToString) -> Self {
        self.params.push(FilterParam {
            key: None,
            value: value.to_string(),
        });
        self
    }

    /// Value of option `key`, if set.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.key.as_deref() == Some(key))
            .map(|p| p.value.as_str())
    }

    fn render_into(&self, out: &mut String) {
        for l in &self.inputs {
            let _ = write!(out, "[{l}]");
        }
        out.push_str(&self.filter);
        for (i, p) in self.params.iter().enumerate() {
            out.push(if i == 0 { '=' } else { ':' });
            if let Some(k) = &p.key {
                let _ = write!(out, "{k}=");
            }
            out.push_str(&p.value);
        }
        for l in &self.outputs {
            let _ = write!(out, "[{l}]");
        }
    }
}

/// Ordered list of filter nodes, rendered to ffmpeg `-filter_complex` syntax.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterGraph {
    nodes: Vec<FilterNode>,
}

impl FilterGraph {
    /// Empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node. Nodes may only consume labels produced by earlier nodes.
    pub fn push(&mut self, node: FilterNode) -> &mut Self {
        self.nodes.push(node);
        self
    }

    /// Nodes in order.
    pub fn nodes(&self) -> &[FilterNode] {
        &self.nodes
    }

    /// Nodes running `filter`.
    pub fn nodes_named<'a>(&'a self, filter: &'a str) -> impl Iterator<Item = &'a FilterNode> + 'a {
        self.nodes.iter().filter(move |n| n.filter == filter)
    }

    /// Check label wiring: every produced label is unique and consumed exactly once, every
    /// consumed label is a stream specifier (`N:a`) or was produced earlier, and only `sink`
    /// is left unconsumed.
    pub fn validate(&self, sink: &str) -> ChatReelResult<()> {
        let mut produced = HashSet::<&str>::new();
        let mut open = HashSet::<&str>::new();
        for (i, n) in self.nodes.iter().enumerate() {
            if n.filter.is_empty() {
                return Err(ChatReelError::mix(format!("filter node {i} has no filter name")));
            }
            for l in &n.inputs {
                if is_stream_specifier(l) {
                    continue;
                }
                if !open.remove(l.as_str()) {
                    return Err(ChatReelError::mix(format!(
                        "filter node {i} ({}) consumes unknown or already used label '{l}'",
                        n.filter
                    )));
                }
            }
            for l in &n.outputs {
                if !produced.insert(l.as_str()) {
                    return Err(ChatReelError::mix(format!("label '{l}' produced twice")));
                }
                open.insert(l.as_str());
            }
        }
        if open.len() != 1 || !open.contains(sink) {
            let mut dangling: Vec<_> = open.into_iter().collect();
            dangling.sort_unstable();
            return Err(ChatReelError::mix(format!(
                "graph must end in exactly '{sink}', open labels: {dangling:?}"
            )));
        }
        Ok(())
    }

    /// `-filter_complex` text: nodes joined by `;`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, n) in self.nodes.iter().enumerate() {
            if i > 0 {
                out.push(';');
            }
            n.render_into(&mut out);
        }
        out
    }
}

fn is_stream_specifier(label: &str) -> bool {
    label
        .split_once(':')
        .is_some_and(|(idx, _)| !idx.is_empty() && idx.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
#[path = "../../tests/unit/audio/graph.rs"]
mod tests;
