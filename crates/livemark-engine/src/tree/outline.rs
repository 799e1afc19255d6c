//! Owned snapshots of subtrees.
//!
//! An [`Outline`] carries no node ids, so two trees built independently can
//! be compared for structural equality, printed in test snapshots or as
//! JSON, or fed back through [`super::Tree::build`].

use std::fmt;

use serde::Serialize;

use super::{Attributes, Tag};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outline {
    Text(String),
    Element {
        tag: Tag,
        #[serde(skip_serializing_if = "Attributes::is_empty")]
        attributes: Attributes,
        children: Vec<Outline>,
    },
}

impl Outline {
    pub fn text(s: impl Into<String>) -> Self {
        Outline::Text(s.into())
    }

    pub fn element(tag: impl Into<Tag>, children: Vec<Outline>) -> Self {
        Outline::Element {
            tag: tag.into(),
            attributes: Attributes::new(),
            children,
        }
    }

    pub fn element_with<'a>(
        tag: impl Into<Tag>,
        attributes: impl IntoIterator<Item = (&'a str, &'a str)>,
        children: Vec<Outline>,
    ) -> Self {
        Outline::Element {
            tag: tag.into(),
            attributes: attributes
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            children,
        }
    }
}

/// Compact call-like form: `p("he", strong("llo"))`, `a[href="x"]("t")`.
impl fmt::Display for Outline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outline::Text(s) => write!(f, "{s:?}"),
            Outline::Element {
                tag,
                attributes,
                children,
            } => {
                write!(f, "{tag}")?;
                if !attributes.is_empty() {
                    let attrs: Vec<String> = attributes
                        .iter()
                        .map(|(k, v)| format!("{k}={v:?}"))
                        .collect();
                    write!(f, "[{}]", attrs.join(" "))?;
                }
                write!(f, "(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{child}")?;
                }
                write!(f, ")")
            }
        }
    }
}
