//! PDF content stream operator implementations.
//!
//! Operators are grouped by category:
//! - `graphics_state` - State stack, transforms and ExtGState (q, Q, cm, w, J, j, M, d, ri, i, gs)
//! - `color` - Color spaces, values and patterns (G, g, RG, rg, K, k, CS, cs, SC, SCN, sc, scn)
//! - `path` - Path construction, painting and clipping (m, l, c, v, y, h, re, S, s, f, F, f\*, B, B\*, b, b\*, n, W, W\*)
//! - `shading` - Shading fills and their subdivision (sh)
//! - `text` - Text state, positioning and showing (BT, ET, Tc, Tw, Tz, TL, Tf, Tr, Ts, Td, TD, Tm, T\*, Tj, TJ, ', ")
//! - `xobject` - XObjects, images and marked content (Do, BI, BMC, BDC, EMC, BX, EX)
//!
//! Each file adds an `impl` block to [`Interpreter`](crate::interp::Interpreter).

mod color;
mod graphics_state;
mod path;
mod shading;
mod text;
mod xobject;
