use crate::geometry::{Rect, Vec2};

/// Zoom used when no section applies, and for centered sections.
pub const DEFAULT_ZOOM: f32 = ZoomTag::Far.zoom_level();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoomTag {
    Close,
    Medium,
    Far,
    VeryFar,
    Centered,
}

impl ZoomTag {
    pub const fn zoom_level(self) -> f32 {
        match self {
            ZoomTag::Close => 2.0,
            ZoomTag::Medium => 1.2,
            ZoomTag::Far | ZoomTag::Centered => 0.9,
            ZoomTag::VeryFar => 0.6,
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "Close" => Some(ZoomTag::Close),
            "Medium" => Some(ZoomTag::Medium),
            "Far" => Some(ZoomTag::Far),
            "VeryFar" => Some(ZoomTag::VeryFar),
            "Center" | "Centered" => Some(ZoomTag::Centered),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Section {
    pub bounds: Rect,
    /// `None` keeps whatever zoom the camera already has.
    pub zoom: Option<f32>,
    pub centered: bool,
}

impl Section {
    pub fn new(bounds: Rect, tag: Option<ZoomTag>) -> Self {
        match tag {
            Some(ZoomTag::Centered) => Self {
                bounds,
                zoom: Some(DEFAULT_ZOOM),
                centered: true,
            },
            Some(tag) => Self {
                bounds,
                zoom: Some(tag.zoom_level()),
                centered: false,
            },
            None => Self {
                bounds,
                zoom: None,
                centered: false,
            },
        }
    }

    pub fn area(&self) -> f32 {
        self.bounds.area()
    }

    pub fn center(&self) -> Vec2 {
        self.bounds.center()
    }

    pub fn contains(&self, bounding_box: &Rect) -> bool {
        self.bounds.intersects(bounding_box)
    }
}

/// Static camera regions in load order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionIndex {
    sections: Vec<Section>,
}

impl SectionIndex {
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    /// Index of the smallest-area section touching `bounding_box`. Equal areas keep the first
    /// one in load order.
    pub fn deepest_containing(&self, bounding_box: &Rect) -> Option<usize> {
        let mut deepest: Option<(usize, f32)> = None;
        for (index, section) in self.sections.iter().enumerate() {
            if !section.contains(bounding_box) {
                continue;
            }
            let area = section.area();
            if deepest.map_or(true, |(_, best)| area < best) {
                deepest = Some((index, area));
            }
        }
        deepest.map(|(index, _)| index)
    }
}
