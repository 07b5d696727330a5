//! Property lookup by node and property name

use crate::fit::strings::Strings;
use crate::fit::structure::property_value_encoding::PropertyValue;
use crate::fit::structure::walker::{ScanError, StructureWalker, Token};

/// Search the structure block for the property `property_name` of the node `node_name`.
///
/// Nodes are matched by their unit name alone (e.g. `kernel@1`, or `""` for the root node), not by path.
/// A property only matches while the matching node is the innermost open node, so properties of child nodes or
/// properties following a child node are never attributed to the parent.
///
/// Every call is an independent scan from the start of the structure block.
pub(crate) fn find_property<'buf>(
    walker: StructureWalker<'buf>,
    strings: &Strings<'buf>,
    node_name: &str,
    property_name: &str,
) -> Result<PropertyValue<'buf>, ScanError> {
    let mut in_target_node = false;

    for record in walker {
        match record?.token {
            Token::BeginNode { name } => {
                in_target_node = name.to_bytes() == node_name.as_bytes();
            }
            Token::Prop(prop) if in_target_node => {
                let name = strings.get_string(prop.name_offset)?;
                if name.to_bytes() == property_name.as_bytes() {
                    log::trace!(
                        "found property {}/{} ({} bytes)",
                        node_name,
                        property_name,
                        prop.value.len()
                    );
                    return Ok(PropertyValue::new(prop.value));
                }
            }
            Token::Prop(_) | Token::Nop => {}
            Token::EndNode => in_target_node = false,
            Token::End => break,
        }
    }

    Err(ScanError::NotFound)
}
