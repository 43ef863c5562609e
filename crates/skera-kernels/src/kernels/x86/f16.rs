//! AVX2/FMA accelerated indexed dot product for F16 storage.
//!
//! Uses F16C to widen half-precision lanes to F32 before the multiply, so
//! the accumulation precision matches the scalar kernels.

#![allow(unsafe_code)]
use super::common::{hsum_ps_avx, load_f16_as_ps};
use half::f16;
#[cfg(target_arch = "x86")]
use std::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

/// Computes `out_chunk[i] = dot(e_rows[i], classes[indices[i]])` for F16
/// storage using AVX2/FMA/F16C.
///
/// Pointers address the raw u16 bit patterns of the F16 values.
///
/// # Safety
///
/// The caller must have verified AVX2/FMA/F16C support, that `e_rows`
/// covers `out_chunk.len() * k` elements, that `indices` has one entry per
/// output element, and that every index addresses a full row of `classes`.
#[target_feature(enable = "avx2", enable = "fma", enable = "f16c")]
pub(crate) unsafe fn indexed_dot_vec_f16(
    out_chunk: &mut [f32],
    e_rows: *const u16,
    classes: *const u16,
    indices: &[u32],
    k: usize,
) {
    unsafe {
        let mut e_row_ptr = e_rows;
        for (out_val, &class_idx) in out_chunk.iter_mut().zip(indices.iter()) {
            let mut a_ptr = e_row_ptr;
            let mut c_ptr = classes.add(class_idx as usize * k);

            let mut sum0 = _mm256_setzero_ps();
            let mut sum1 = _mm256_setzero_ps();
            let mut sum2 = _mm256_setzero_ps();
            let mut sum3 = _mm256_setzero_ps();

            let mut n = k;
            while n >= 32 {
                let a0 = load_f16_as_ps(a_ptr);
                let a1 = load_f16_as_ps(a_ptr.add(8));
                let a2 = load_f16_as_ps(a_ptr.add(16));
                let a3 = load_f16_as_ps(a_ptr.add(24));

                let c0 = load_f16_as_ps(c_ptr);
                let c1 = load_f16_as_ps(c_ptr.add(8));
                let c2 = load_f16_as_ps(c_ptr.add(16));
                let c3 = load_f16_as_ps(c_ptr.add(24));

                sum0 = _mm256_fmadd_ps(a0, c0, sum0);
                sum1 = _mm256_fmadd_ps(a1, c1, sum1);
                sum2 = _mm256_fmadd_ps(a2, c2, sum2);
                sum3 = _mm256_fmadd_ps(a3, c3, sum3);

                a_ptr = a_ptr.add(32);
                c_ptr = c_ptr.add(32);
                n -= 32;
            }

            while n >= 8 {
                let a0 = load_f16_as_ps(a_ptr);
                let c0 = load_f16_as_ps(c_ptr);
                sum0 = _mm256_fmadd_ps(a0, c0, sum0);
                a_ptr = a_ptr.add(8);
                c_ptr = c_ptr.add(8);
                n -= 8;
            }

            sum0 = _mm256_add_ps(_mm256_add_ps(sum0, sum1), _mm256_add_ps(sum2, sum3));
            let mut sum = hsum_ps_avx(sum0);

            while n > 0 {
                let val_a = f16::from_bits(*a_ptr).to_f32();
                let val_c = f16::from_bits(*c_ptr).to_f32();
                sum += val_a * val_c;
                a_ptr = a_ptr.add(1);
                c_ptr = c_ptr.add(1);
                n -= 1;
            }

            *out_val = sum;
            e_row_ptr = e_row_ptr.add(k);
        }
    }
}
