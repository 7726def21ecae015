//! imvox-state - The viewer state schema
//!
//! A typed, mutable model of the complete state of a volumetric-data
//! viewer, convertible to and from the JSON form used for sharing and
//! embedding. The tree is rooted at [`ViewerState`]; the polymorphic
//! families ([`Layer`], [`Annotation`], [`Tool`], [`Layout`]) dispatch on
//! wire discriminants through fixed registries.
//!
//! Decoding validates eagerly and preserves unknown keys verbatim, so a
//! state written by a newer producer survives a decode/encode round trip.
//! Emission is minimal: fields an input never mentioned and a caller
//! never set stay off the wire. States decoded read-only reject every
//! mutation down the whole tree. [`Interpolate`] blends two states for
//! animation, holding the start state wherever blending has no meaning.

pub mod annotations;
pub mod colors;
pub mod coords;
pub mod equivalence;
pub mod interp;
pub mod layers;
pub mod layout;
pub mod managed;
pub mod navigation;
pub mod panels;
pub mod segments;
pub mod shader;
pub mod source;
pub mod tools;
pub mod viewer;

pub use annotations::{
    Annotation, AnnotationBase, AnnotationPropertySpec, AxisAlignedBoundingBoxAnnotation,
    EllipsoidAnnotation, LineAnnotation, PointAnnotation,
};
pub use colors::hex_string_from_segment_id;
pub use coords::{CoordinateSpace, CoordinateSpaceTransform, DimensionScale};
pub use equivalence::EquivalenceMap;
pub use interp::{
    interpolate_linear, interpolate_linear_optional_vectors, interpolate_linear_vectors,
    interpolate_zoom, quaternion_slerp, Interpolate, UNIT_QUATERNION,
};
pub use layers::{
    AnnotationLayer, ImageLayer, Layer, LayerBase, PointAnnotationLayer, SegmentationColorGroup,
    SegmentationLayer, SingleMeshLayer, SkeletonRenderingOptions,
};
pub use layout::{
    column_layout, row_layout, CrossSection, CrossSectionMap, DataPanelLayout, LayerGroupViewer,
    Layout, StackLayout, DATA_PANEL_LAYOUTS,
};
pub use managed::{Layers, ManagedLayer};
pub use navigation::{
    DimensionPlaybackVelocity, Linked, LinkedDepthRange, LinkedOrientationState, LinkedPosition,
    LinkedZoomFactor, NavigationLink,
};
pub use panels::{
    HelpPanelState, LayerListPanelState, LayerSidePanelState, SelectedLayerState,
    SidePanelLocation, StatisticsDisplayState, ToolPalette,
};
pub use segments::{SegmentSpec, StarredSegments, VisibleSegments};
pub use shader::{
    InvlerpParameters, ShaderControlValue, ShaderControls, TransferFunctionParameters,
};
pub use source::{
    LayerDataSource, LayerDataSources, LayerDataSubsource, LocalSourceHandle, LocalSourceKind,
};
pub use tools::{Tool, ToolKind};
pub use viewer::ViewerState;

// The json-layer vocabulary used in every signature of this crate.
pub use imvox_json::{
    AccessMode, FromJson, StateError, StateResult, ToJson, TypedList, TypedMap, TypedSet,
};
