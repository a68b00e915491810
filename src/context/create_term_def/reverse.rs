//! Part of create term definition algorithm, for reverse term definitions.

use std::collections::HashMap;

use anyhow::anyhow;
use serde_json::{Map as JsonMap, Value};

use crate::{
    context::{
        create_term_def::OptionalParams,
        definition::{Container, ContainerItem, DefinitionBuilder},
        Context,
    },
    error::{ErrorCode, Result},
    expand::iri::ExpandIriOptions,
    iri::is_absolute_or_blank_node_ident,
    json::Nullable,
    processor::{Processor, Warning},
    remote::LoadRemoteDocument,
};

/// Runs rest of the create term definition algorithm for the case `@reverse`
/// exists.
///
/// Note that this intentionally commits the definition without checking for
/// unrecognized entries, matching the observable behavior of existing
/// processors.
// Step 14
#[allow(clippy::too_many_arguments)]
pub(super) async fn run_for_reverse<L: LoadRemoteDocument>(
    processor: &Processor<L>,
    active_context: &mut Context,
    local_context: &JsonMap<String, Value>,
    term: &str,
    defined: &mut HashMap<String, bool>,
    params: &OptionalParams,
    value: &JsonMap<String, Value>,
    reverse: &Value,
    mut definition: DefinitionBuilder,
) -> Result<()> {
    // Step 14.1
    if value.contains_key("@id") || value.contains_key("@nest") {
        return Err(
            ErrorCode::InvalidReverseProperty.and_source(anyhow!("Found `@id` or `@nest` entries"))
        );
    }
    // Step 14.2
    let reverse = match reverse {
        Value::String(s) => s,
        v => {
            return Err(ErrorCode::InvalidIriMapping
                .and_source(anyhow!("Expected string as @reverse but got {:?}", v)))
        }
    };
    // Step 14.3
    if crate::syntax::has_form_of_keyword(reverse) {
        processor.warn(Warning::KeywordLikeValue(reverse.clone()));
        return Ok(());
    }
    // Step 14.4
    let reverse = ExpandIriOptions::mutable(active_context, local_context, defined, params)
        .vocab(true)
        .expand_str(processor, reverse)
        .await?
        .ok_or_else(|| {
            ErrorCode::InvalidIriMapping
                .and_source(anyhow!("@reverse ({:?}) is expanded to `null`", reverse))
        })?;
    if is_absolute_or_blank_node_ident(&reverse) {
        definition.set_iri(reverse);
    } else {
        return Err(ErrorCode::InvalidIriMapping.and_source(anyhow!(
            "Expanded @reverse value ({:?}) is neither an IRI nor blank node identifier",
            reverse
        )));
    }
    // Step 14.5
    if let Some(container) = value.get("@container") {
        let container = Nullable::<Container>::try_from(container)
            .map_err(|e| ErrorCode::InvalidContainerMapping.and_source(e))?;
        match container {
            Nullable::Null
            | Nullable::Value(Container::Single(ContainerItem::Set))
            | Nullable::Value(Container::Single(ContainerItem::Index)) => {
                definition.set_container(container);
            }
            v => {
                return Err(
                    ErrorCode::InvalidReverseProperty.and_source(anyhow!("`@container` = {:?}", v))
                )
            }
        }
    }
    // Step 14.6
    definition.set_reverse(true);
    // Step 14.7
    active_context.insert_term_definition(term, definition.build());
    defined.insert(term.to_owned(), true);

    Ok(())
}
