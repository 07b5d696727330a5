//! Structure Block handling
//!
//! The structure block is a linear sequence of tagged records.
//! Nesting is expressed purely through `FDT_BEGIN_NODE`/`FDT_END_NODE` pairs so the block can only be understood by
//! walking it from the start, which is what [`StructureWalker`] does.
//!
//! The token encoding follows [Devicetree Spec Section 5.4](https://devicetree-specification.readthedocs.io/en/v0.3/flattened-format.html#structure-block).

/// Marks the beginning of a node.
/// It is followed by the node's unit name as a nul-terminated string and zeroed padding up to the next token.
pub(crate) const FDT_BEGIN_NODE: u32 = 0x00000001;

/// Marks the end of a node. It has no extra data.
pub(crate) const FDT_END_NODE: u32 = 0x00000002;

/// Marks a property of the currently open node.
/// It is followed by the value length, the name offset into the strings block, the value itself and padding.
pub(crate) const FDT_PROP: u32 = 0x00000003;

/// Ignored by everything reading the structure block.
/// Parts of the tree can be removed by overwriting them with this token.
pub(crate) const FDT_NOP: u32 = 0x00000004;

/// Marks the end of the structure block.
pub(crate) const FDT_END: u32 = 0x00000009;

pub(crate) mod property_value_encoding;
pub(crate) mod scanner;
pub(crate) mod walker;
