use std::fmt::Display;

use self::visitor::Visitor;

#[derive(Debug, Hash, Clone, PartialEq, Eq)]
pub enum AstNode {
    Literal(char),
    Seq(Box<AstNode>, Box<AstNode>),
    Or(Box<AstNode>, Box<AstNode>),
    Star(Box<AstNode>),
    Plus(Box<AstNode>),
}

pub trait Data {
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::Result;
}

impl AstNode {
    pub fn seq(left: AstNode, right: AstNode) -> AstNode {
        AstNode::Seq(Box::new(left), Box::new(right))
    }

    pub fn or(left: AstNode, right: AstNode) -> AstNode {
        AstNode::Or(Box::new(left), Box::new(right))
    }

    pub fn star(child: AstNode) -> AstNode {
        AstNode::Star(Box::new(child))
    }

    pub fn plus(child: AstNode) -> AstNode {
        AstNode::Plus(Box::new(child))
    }

    /// Operator label, as drawn on parse tree nodes by [`AstNode::to_dot`].
    pub fn label(&self) -> String {
        match self {
            AstNode::Literal(c) => c.to_string(),
            AstNode::Seq(_, _) => String::from("."),
            AstNode::Or(_, _) => String::from("|"),
            AstNode::Star(_) => String::from("*"),
            AstNode::Plus(_) => String::from("+"),
        }
    }

    /// Number of nodes in the tree.
    pub fn size(&self) -> usize {
        match self {
            AstNode::Literal(_) => 1,
            AstNode::Seq(left, right) | AstNode::Or(left, right) => 1 + left.size() + right.size(),
            AstNode::Star(child) | AstNode::Plus(child) => 1 + child.size(),
        }
    }

    /// Whether the language of this subtree contains the empty word.
    pub fn nullable(&self) -> bool {
        match self {
            AstNode::Literal(_) => false,
            AstNode::Seq(left, right) => left.nullable() && right.nullable(),
            AstNode::Or(left, right) => left.nullable() || right.nullable(),
            AstNode::Star(_) => true,
            AstNode::Plus(child) => child.nullable(),
        }
    }

    /// GraphViz Dot code of the parse tree, one circle per node labelled
    /// with its operator or literal, edges from parent to children.
    pub fn to_dot(&self) -> String {
        let mut drawer = TreeDrawer::default();
        drawer.draw(self);
        format!(
            "digraph ParseTree {{\n    node [shape = circle];\n{}{}}}\n",
            drawer.nodes, drawer.edges
        )
    }
}

#[derive(Default)]
struct TreeDrawer {
    next_id: usize,
    nodes: String,
    edges: String,
}

impl TreeDrawer {
    fn draw(&mut self, node: &AstNode) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes += &format!(
            "    {} [label = \"{}\"];\n",
            id,
            node.label().escape_default()
        );
        for child in node.accept(self) {
            self.edges += &format!("    {} -> {};\n", id, child);
        }
        id
    }
}

// children are drawn left to right; the result is their node ids
impl Visitor for TreeDrawer {
    type Result = Vec<usize>;

    fn visit_literal(&mut self, _: char) -> Vec<usize> {
        vec![]
    }

    fn visit_seq(&mut self, left: &AstNode, right: &AstNode) -> Vec<usize> {
        vec![self.draw(left), self.draw(right)]
    }

    fn visit_or(&mut self, left: &AstNode, right: &AstNode) -> Vec<usize> {
        vec![self.draw(left), self.draw(right)]
    }

    fn visit_star(&mut self, child: &AstNode) -> Vec<usize> {
        vec![self.draw(child)]
    }

    fn visit_plus(&mut self, child: &AstNode) -> Vec<usize> {
        vec![self.draw(child)]
    }
}

impl Data for AstNode {
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::Result {
        match self {
            Self::Literal(c) => visitor.visit_literal(*c),
            Self::Seq(left, right) => visitor.visit_seq(left, right),
            Self::Or(left, right) => visitor.visit_or(left, right),
            Self::Star(child) => visitor.visit_star(child),
            Self::Plus(child) => visitor.visit_plus(child),
        }
    }
}

struct Grouped<'a>(&'a AstNode, bool);

impl<'a> Display for Grouped<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.1 {
            write!(f, "({})", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

// Parentheses are emitted only where the grammar needs them to rebuild the
// same tree: alternation and concatenation are left-associative.
impl Display for AstNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal(c) => write!(f, "{}", c),
            Self::Or(left, right) => write!(
                f,
                "{}|{}",
                left,
                Grouped(right, matches!(**right, AstNode::Or(_, _)))
            ),
            Self::Seq(left, right) => write!(
                f,
                "{}{}",
                Grouped(left, matches!(**left, AstNode::Or(_, _))),
                Grouped(
                    right,
                    matches!(**right, AstNode::Or(_, _) | AstNode::Seq(_, _))
                )
            ),
            Self::Star(child) => write!(
                f,
                "{}*",
                Grouped(child, matches!(**child, AstNode::Or(_, _) | AstNode::Seq(_, _)))
            ),
            Self::Plus(child) => write!(
                f,
                "{}+",
                Grouped(child, matches!(**child, AstNode::Or(_, _) | AstNode::Seq(_, _)))
            ),
        }
    }
}

pub mod visitor {
    use super::AstNode;

    pub trait Visitor {
        type Result;
        fn visit_literal(&mut self, literal: char) -> Self::Result;
        fn visit_seq(&mut self, left: &AstNode, right: &AstNode) -> Self::Result;
        fn visit_or(&mut self, left: &AstNode, right: &AstNode) -> Self::Result;
        fn visit_star(&mut self, child: &AstNode) -> Self::Result;
        fn visit_plus(&mut self, child: &AstNode) -> Self::Result;
    }
}
