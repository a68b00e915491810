//! Inverse context.
//!
//! See <https://www.w3.org/TR/json-ld11-api/#inverse-context-creation>.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::context::Context;
use crate::json::Nullable;

/// Type/language branch of an inverse context entry.
///
/// Each map goes from a discriminating value (a type IRI, a language tag, or
/// one of the `@`-prefixed markers) to the selected term.
#[derive(Default, Debug)]
struct InverseEntry {
    /// `@any` branch, carrying the fallback term under `@none`.
    any: HashMap<String, String>,
    /// `@language` branch.
    language: HashMap<String, String>,
    /// `@type` branch.
    ty: HashMap<String, String>,
}

impl InverseEntry {
    /// Returns the branch selected by the given discriminator.
    fn branch(&self, type_or_language: &str) -> &HashMap<String, String> {
        match type_or_language {
            "@language" => &self.language,
            "@type" => &self.ty,
            "@any" => &self.any,
            v => unreachable!("Invalid type/language discriminator {:?}", v),
        }
    }

    /// Returns the branch selected by the given discriminator, mutably.
    fn branch_mut(&mut self, type_or_language: &str) -> &mut HashMap<String, String> {
        match type_or_language {
            "@language" => &mut self.language,
            "@type" => &mut self.ty,
            "@any" => &mut self.any,
            v => unreachable!("Invalid type/language discriminator {:?}", v),
        }
    }

    /// Records `term` under the given branch and key, unless the cell is
    /// already taken (first writer wins).
    fn record(&mut self, type_or_language: &str, key: &str, term: &str) {
        self.branch_mut(type_or_language)
            .entry(key.to_owned())
            .or_insert_with(|| term.to_owned());
    }
}

/// Inverse context: a lookup table from IRI, container mapping and
/// type/language discriminators to the best term for compaction.
#[derive(Default, Debug)]
pub(crate) struct InverseContext {
    /// `IRI -> container key -> type/language branches`.
    map: HashMap<String, HashMap<String, InverseEntry>>,
}

impl InverseContext {
    /// Checks whether any term maps to the given IRI.
    pub(crate) fn contains(&self, iri: &str) -> bool {
        self.map.contains_key(iri)
    }

    /// Runs the term selection algorithm.
    ///
    /// Scans the given container keys in order; for the first entry found,
    /// scans the preferred values in order against the branch selected by
    /// `type_or_language`. Ties between terms recorded under the same cell
    /// were already resolved at construction time, shortest term first.
    ///
    /// See <https://www.w3.org/TR/json-ld11-api/#term-selection>.
    pub(crate) fn select_term(
        &self,
        iri: &str,
        containers: &[&str],
        type_or_language: &str,
        preferred_values: &[String],
    ) -> Option<&str> {
        let container_map = self.map.get(iri)?;
        for container in containers {
            let entry = match container_map.get(*container) {
                Some(entry) => entry,
                None => continue,
            };
            let branch = entry.branch(type_or_language);
            for item in preferred_values {
                if let Some(term) = branch.get(item) {
                    return Some(term);
                }
            }
        }

        None
    }
}

impl From<&Context> for InverseContext {
    fn from(context: &Context) -> Self {
        let mut result = Self::default();

        let default_language = context
            .default_language()
            .unwrap_or("@none")
            .to_lowercase();

        // Terms are processed by ascending length, ties broken
        // lexicographically, so that shorter terms win contested cells.
        let mut definitions: Vec<_> = context.term_definitions().collect();
        definitions.sort_by(|(a, _), (b, _)| {
            let ord = a.len().cmp(&b.len());
            if ord == Ordering::Equal {
                a.cmp(b)
            } else {
                ord
            }
        });

        for (term, definition) in definitions {
            let iri = match definition.iri() {
                Nullable::Null => continue,
                Nullable::Value(iri) => iri,
            };
            let container_key = definition
                .container()
                .map_or_else(|| "@none".to_owned(), |container| container.key());

            let container_map = result.map.entry(iri.to_owned()).or_default();
            let entry = container_map.entry(container_key).or_default();
            entry.record("@any", "@none", term);

            if definition.is_reverse() {
                entry.record("@type", "@reverse", term);
            } else if definition.ty() == Some("@none") {
                entry.record("@language", "@any", term);
                entry.record("@type", "@any", term);
            } else if let Some(ty) = definition.ty() {
                entry.record("@type", ty, term);
            } else {
                match (definition.language(), definition.direction()) {
                    (Some(language), Some(direction)) => {
                        let key = match (language, direction) {
                            (Nullable::Value(language), Nullable::Value(direction)) => {
                                format!("{}_{}", language, direction.as_str()).to_lowercase()
                            }
                            (Nullable::Value(language), Nullable::Null) => language.to_lowercase(),
                            (Nullable::Null, Nullable::Value(direction)) => {
                                format!("_{}", direction.as_str())
                            }
                            (Nullable::Null, Nullable::Null) => "@null".to_owned(),
                        };
                        entry.record("@language", &key, term);
                    }
                    (Some(language), None) => {
                        let key = match language {
                            Nullable::Value(language) => language.to_lowercase(),
                            Nullable::Null => "@null".to_owned(),
                        };
                        entry.record("@language", &key, term);
                    }
                    (None, Some(direction)) => {
                        let key = match direction {
                            Nullable::Value(direction) => format!("_{}", direction.as_str()),
                            Nullable::Null => "@none".to_owned(),
                        };
                        entry.record("@language", &key, term);
                    }
                    (None, None) => {
                        if let Some(direction) = context.default_base_direction() {
                            let lang_dir = format!(
                                "{}_{}",
                                context.default_language().unwrap_or_default(),
                                direction.as_str()
                            )
                            .to_lowercase();
                            entry.record("@language", &lang_dir, term);
                        } else {
                            entry.record("@language", &default_language, term);
                        }
                        entry.record("@language", "@none", term);
                        entry.record("@type", "@none", term);
                    }
                }
            }
        }

        result
    }
}
