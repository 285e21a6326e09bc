// SPDX-License-Identifier: MIT
//! # gram-scale: Geometry and CPU Kernels for Photo Normalization
//!
//! This crate holds the pixel-level half of the gram pipeline: the floating-point
//! geometry used to plan crops and the SIMD-backed kernels that resize and crop
//! packed 4-channel buffers.
//!
//! ## Key Components
//!
//! - [`plan`]: sizes, floating-point rectangles, centred-square planning and the
//!   conversion of a rectangle into integral pixel bounds
//! - [`cpu`]: resize (via fast_image_resize) and exact row-copy crop kernels
//!
//! ## Pixel Layout
//!
//! Every kernel works on 8-bit, 4-channel packed pixels. The channel order is
//! irrelevant to the kernels (ARGB, RGBA and BGRA are all treated as four opaque
//! bytes), so callers keep whatever layout they already have.
//!
//! ## Usage Example
//!
//! ```rust
//! use gram_scale::cpu::{resize_rgba_cpu, ResizeFilter};
//! use gram_scale::plan::{center_square, Size};
//!
//! let src_size = Size::new(1280, 960);
//! let square = center_square(src_size);
//! assert_eq!(square.x, 160.0);
//!
//! let src = vec![0u8; (src_size.w * src_size.h * 4) as usize];
//! let dst_size = Size::square(720);
//! let mut dst = vec![0u8; dst_size.byte_len()];
//! let mut resizer = fast_image_resize::Resizer::new();
//! resize_rgba_cpu(
//!     &mut resizer,
//!     &src,
//!     src_size,
//!     None,
//!     dst_size,
//!     ResizeFilter::Bilinear,
//!     &mut dst,
//!     None,
//! )
//! .unwrap();
//! ```

pub mod cpu;
pub mod plan;
