//! Descriptor set numbering per layout revision
//!
//! Block contents are identical across revisions. Only the set and binding
//! numbers move, so a revision is a tag that picks a row of the table below.

use serde::{Deserialize, Serialize};

/// Binding layout revision the compiled shaders were built against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LayoutVersion {
    /// Per-pass data packed into set 1 with one binding per concern
    Legacy,
    /// One set per concern, sets 4 to 8
    #[default]
    Current,
}

/// Resources bound by the shading stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceBinding {
    /// [`GlobalConstants`](super::GlobalConstants)
    GlobalConstants,
    /// Lighting block for the active [`LightingType`](crate::render::lighting::LightingType)
    LightingConstants,
    /// Cloud shadow matrix and cloud texture
    CloudConstants,
    /// Shadow constants and the cascade depth array
    ShadowConstants,
    /// Material constants and textures
    MaterialConstants,
    /// Per-render-item constants and bone matrices
    RenderItemConstants,
    /// Radius cursor decal buffer, count and texture array
    RadiusCursorDecals,
}

impl ResourceBinding {
    /// Every resource in declaration order
    pub const ALL: [Self; 7] = [
        Self::GlobalConstants,
        Self::LightingConstants,
        Self::CloudConstants,
        Self::ShadowConstants,
        Self::MaterialConstants,
        Self::RenderItemConstants,
        Self::RadiusCursorDecals,
    ];
}

/// A `(set, binding)` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SetBinding {
    /// Descriptor set index
    pub set: u32,
    /// Binding index within the set
    pub binding: u32,
}

impl SetBinding {
    const fn new(set: u32, binding: u32) -> Self {
        Self { set, binding }
    }
}

/// Resolved binding table for one [`LayoutVersion`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingLayout {
    version: LayoutVersion,
}

impl BindingLayout {
    /// Table for `version`
    pub const fn new(version: LayoutVersion) -> Self {
        Self { version }
    }

    /// Revision this table describes
    pub const fn version(&self) -> LayoutVersion {
        self.version
    }

    /// Where `resource` is bound
    pub const fn binding(&self, resource: ResourceBinding) -> SetBinding {
        use ResourceBinding as R;
        match (self.version, resource) {
            (_, R::GlobalConstants) => SetBinding::new(0, 0),
            (_, R::MaterialConstants) => SetBinding::new(2, 0),
            (LayoutVersion::Legacy, R::LightingConstants) => SetBinding::new(1, 0),
            (LayoutVersion::Legacy, R::CloudConstants) => SetBinding::new(1, 1),
            (LayoutVersion::Legacy, R::ShadowConstants) => SetBinding::new(1, 2),
            (LayoutVersion::Legacy, R::RadiusCursorDecals) => SetBinding::new(1, 3),
            (LayoutVersion::Legacy, R::RenderItemConstants) => SetBinding::new(3, 0),
            (LayoutVersion::Current, R::LightingConstants) => SetBinding::new(4, 0),
            (LayoutVersion::Current, R::CloudConstants) => SetBinding::new(5, 0),
            (LayoutVersion::Current, R::ShadowConstants) => SetBinding::new(6, 0),
            (LayoutVersion::Current, R::RenderItemConstants) => SetBinding::new(7, 0),
            (LayoutVersion::Current, R::RadiusCursorDecals) => SetBinding::new(8, 0),
        }
    }

    /// Number of descriptor sets the pipeline layout must declare
    pub fn set_count(&self) -> u32 {
        ResourceBinding::ALL
            .iter()
            .map(|&r| self.binding(r).set + 1)
            .max()
            .unwrap_or(0)
    }
}

impl From<LayoutVersion> for BindingLayout {
    fn from(version: LayoutVersion) -> Self {
        Self::new(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_legacy_packs_per_pass_data_into_set_one() {
        let layout = BindingLayout::new(LayoutVersion::Legacy);
        assert_eq!(layout.binding(ResourceBinding::LightingConstants), SetBinding::new(1, 0));
        assert_eq!(layout.binding(ResourceBinding::ShadowConstants), SetBinding::new(1, 2));
        assert_eq!(layout.binding(ResourceBinding::RenderItemConstants), SetBinding::new(3, 0));
        assert_eq!(layout.set_count(), 4);
    }

    #[test]
    fn test_current_renumbers_to_sets_four_through_eight() {
        let layout = BindingLayout::from(LayoutVersion::Current);
        assert_eq!(layout.binding(ResourceBinding::GlobalConstants), SetBinding::new(0, 0));
        assert_eq!(layout.binding(ResourceBinding::LightingConstants), SetBinding::new(4, 0));
        assert_eq!(layout.binding(ResourceBinding::RadiusCursorDecals), SetBinding::new(8, 0));
        assert_eq!(layout.set_count(), 9);
    }

    #[test]
    fn test_no_two_resources_share_a_slot() {
        for version in [LayoutVersion::Legacy, LayoutVersion::Current] {
            let layout = BindingLayout::new(version);
            let slots: HashSet<_> = ResourceBinding::ALL.iter().map(|&r| layout.binding(r)).collect();
            assert_eq!(slots.len(), ResourceBinding::ALL.len(), "{:?}", version);
        }
    }
}
