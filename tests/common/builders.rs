//! Test data builders for creating graph objects

use knoblink_rs::{attach_knob, Knob, KnobHandle, KnobKind, KnobValue, Node, NodeHandle};

/// Builder for creating test knobs
pub struct KnobBuilder {
    name: String,
    kind: KnobKind,
    dimension: usize,
    persistent: bool,
    values: Vec<(usize, KnobValue)>,
    expressions: Vec<(usize, String, bool)>,
}

impl KnobBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: KnobKind::Double,
            dimension: 1,
            persistent: true,
            values: Vec::new(),
            expressions: Vec::new(),
        }
    }

    pub fn kind(mut self, kind: KnobKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    pub fn value(mut self, dimension: usize, value: KnobValue) -> Self {
        self.values.push((dimension, value));
        self
    }

    pub fn expression(mut self, dimension: usize, text: &str, has_ret_var: bool) -> Self {
        self.expressions.push((dimension, text.to_string(), has_ret_var));
        self
    }

    pub fn build(self) -> KnobHandle {
        let mut knob = Knob::new(self.kind, self.name, self.dimension);
        knob.populate();
        knob.set_persistent(self.persistent);
        for (dim, value) in self.values {
            knob.set_value(dim, value).expect("value dimension in range");
        }
        for (dim, text, has_ret_var) in self.expressions {
            knob.set_expression(dim, text, has_ret_var)
                .expect("expression dimension in range");
        }
        knob.into_handle()
    }

    /// Build the knob and attach it to `node`.
    pub fn build_on(self, node: &NodeHandle) -> KnobHandle {
        let knob = self.build();
        attach_knob(node, knob.clone());
        knob
    }
}

/// Builder for creating test nodes with a set of double knobs
pub struct NodeBuilder {
    script_name: String,
    knobs: Vec<KnobBuilder>,
}

impl NodeBuilder {
    pub fn new(script_name: &str) -> Self {
        Self {
            script_name: script_name.to_string(),
            knobs: Vec::new(),
        }
    }

    pub fn knob(mut self, builder: KnobBuilder) -> Self {
        self.knobs.push(builder);
        self
    }

    pub fn build(self) -> NodeHandle {
        let node = Node::create(self.script_name);
        for builder in self.knobs {
            builder.build_on(&node);
        }
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_builder() {
        let node = NodeBuilder::new("Blur1")
            .knob(KnobBuilder::new("size").dimension(2))
            .knob(KnobBuilder::new("mix"))
            .build();

        let node = node.read().unwrap();
        assert_eq!(node.script_name(), "Blur1");
        assert_eq!(node.knobs().len(), 2);
        assert_eq!(node.knob_by_name("size").unwrap().read().unwrap().dimension(), 2);
    }
}
