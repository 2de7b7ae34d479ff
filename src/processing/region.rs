use crate::models::Region;
use image::{DynamicImage, GenericImageView};
use log::{debug, warn};
use indexmap::IndexMap;

/// Pixels added on every side of a template region before cropping.
pub const PADDING: u32 = 3;

/// Field name to cropped sub-image.
pub type FieldImages = IndexMap<String, DynamicImage>;

/// Crops for one document. Fields whose padded region falls entirely
/// outside the image are listed in `skipped` instead of failing the document.
#[derive(Debug, Default)]
pub struct RegionCrops {
    pub images: FieldImages,
    pub skipped: Vec<String>,
}

/// Padded, image-clamped bounds `(x1, y1, x2, y2)` with exclusive right and
/// bottom edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBounds {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl CropBounds {
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }
}

pub struct RegionExtractor;

impl RegionExtractor {
    /// Expands `region` by [`PADDING`] and clamps it to a `width` x `height`
    /// image. `None` when nothing of the region is left.
    pub fn padded_bounds(region: &Region, width: u32, height: u32) -> Option<CropBounds> {
        let bounds = CropBounds {
            x1: region.x1.saturating_sub(PADDING).min(width),
            y1: region.y1.saturating_sub(PADDING).min(height),
            x2: region.x2.saturating_add(PADDING).min(width),
            y2: region.y2.saturating_add(PADDING).min(height),
        };
        if bounds.x2 <= bounds.x1 || bounds.y2 <= bounds.y1 {
            return None;
        }
        Some(bounds)
    }

    /// Crops every field region out of `image`. The source image is untouched.
    pub fn crop(image: &DynamicImage, regions: &IndexMap<String, Region>) -> RegionCrops {
        let (width, height) = image.dimensions();
        let mut crops = RegionCrops::default();

        for (field, region) in regions {
            match Self::padded_bounds(region, width, height) {
                Some(b) => {
                    debug!("Cropping '{}' at {:?}", field, b);
                    crops
                        .images
                        .insert(field.clone(), image.crop_imm(b.x1, b.y1, b.width(), b.height()));
                }
                None => {
                    warn!(
                        "Region for '{}' {:?} lies outside the {}x{} image, skipping",
                        field, region, width, height
                    );
                    crops.skipped.push(field.clone());
                }
            }
        }

        crops
    }
}
