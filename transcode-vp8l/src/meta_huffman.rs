//! Meta-Huffman image and the per-image Huffman code set
//!
//! An image may split itself into square tiles and give each tile its own
//! group of Huffman codes. The tile-to-group mapping is itself stored as a
//! small image, whose green and red bytes hold the group index.

use crate::bitreader::BitReader;
use crate::error::Result;
use crate::htree_group::HTreeGroup;
use crate::huffman::HuffmanCode;

/// Tile grid selecting the Huffman group for each image position
#[derive(Debug, Clone)]
pub struct MetaHuffmanImage {
    bits: u32,
    xsize: usize,
    indices: Vec<u16>,
    num_groups: usize,
}

impl MetaHuffmanImage {
    /// Interpret a decoded entropy image with tiles of `2^bits` pixels
    /// and `xsize` tiles per row
    pub fn from_entropy_image(bits: u32, xsize: usize, pixels: &[u32]) -> Self {
        let indices: Vec<u16> = pixels.iter().map(|&p| ((p >> 8) & 0xffff) as u16).collect();
        let num_groups = indices.iter().copied().max().map_or(1, |max| usize::from(max) + 1);

        tracing::debug!(bits, xsize, num_groups, "Read meta-Huffman image");

        Self {
            bits,
            xsize,
            indices,
            num_groups,
        }
    }

    /// Tile size exponent
    #[inline]
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Number of groups the image refers to
    #[inline]
    pub fn num_groups(&self) -> usize {
        self.num_groups
    }

    /// Group index of the tile containing `(x, y)`
    #[inline]
    pub fn group_index(&self, x: usize, y: usize) -> usize {
        let tile = (x >> self.bits) + self.xsize * (y >> self.bits);
        self.indices.get(tile).map_or(0, |&index| usize::from(index))
    }
}

/// Every Huffman code of one image: the groups, their table arena and the
/// optional tile grid choosing between them
#[derive(Debug, Clone)]
pub struct HuffmanMetadata {
    meta_image: Option<MetaHuffmanImage>,
    groups: Vec<HTreeGroup>,
    arena: Vec<HuffmanCode>,
}

impl HuffmanMetadata {
    /// Read one group per entry of the meta image, or a single group without one
    pub fn read(
        br: &mut BitReader<'_>,
        meta_image: Option<MetaHuffmanImage>,
        color_cache_bits: u32,
        allow_packed: bool,
    ) -> Result<Self> {
        let num_groups = meta_image.as_ref().map_or(1, MetaHuffmanImage::num_groups);

        let mut arena = Vec::new();
        let mut groups = Vec::with_capacity(num_groups);
        for _ in 0..num_groups {
            groups.push(HTreeGroup::read(
                br,
                &mut arena,
                color_cache_bits,
                allow_packed,
            )?);
        }

        Ok(Self {
            meta_image,
            groups,
            arena,
        })
    }

    /// Column mask at which the group has to be looked up again
    ///
    /// Without a meta image only the start of a row triggers a lookup.
    #[inline]
    pub fn column_mask(&self) -> usize {
        match &self.meta_image {
            Some(meta) => (1 << meta.bits()) - 1,
            None => usize::MAX,
        }
    }

    /// Index of the group covering `(x, y)`
    #[inline]
    pub fn group_index(&self, x: usize, y: usize) -> usize {
        self.meta_image
            .as_ref()
            .map_or(0, |meta| meta.group_index(x, y))
    }

    /// Group by index
    #[inline]
    pub fn group(&self, index: usize) -> &HTreeGroup {
        &self.groups[index]
    }

    /// Number of groups
    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    /// Table arena shared by all groups
    #[inline]
    pub fn arena(&self) -> &[HuffmanCode] {
        &self.arena
    }
}
