//! # `tiledmap_io_view`
//!
//! Decouples map formats from the document that is being saved.
//!
//! A host exposes its document through the read-only traits in [`view`]. Saving then
//! either walks those views with a format-specific [`DocumentVisitor`], or first
//! collects an owned IR map with [`build_ir`] and hands that to an emitter. Both paths
//! see the same nodes in the same order.
//!
//! [`IrMapView`] implements the view traits over an IR map, which is how already
//! materialized maps (for example, freshly loaded ones) are saved again.

pub mod builder;
pub mod ir_view;
pub mod view;
pub mod visitor;

pub use builder::{IrBuilder, build_ir, collect_meta};
pub use ir_view::IrMapView;
pub use view::{LayerView, MapView, MetaView, ObjectParent, ObjectView, TileView, TilesetView};
pub use visitor::{DocumentNode, DocumentVisitor};
