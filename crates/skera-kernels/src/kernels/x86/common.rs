#![allow(unsafe_code)]
#[cfg(target_arch = "x86")]
use std::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

/// Helper function to horizontally sum a `__m256` vector.
#[inline]
#[target_feature(enable = "avx2")]
pub(crate) unsafe fn hsum_ps_avx(v: __m256) -> f32 {
    unsafe {
        let vlow = _mm256_castps256_ps128(v);
        let vhigh = _mm256_extractf128_ps(v, 1);
        let vsum = _mm_add_ps(vlow, vhigh);
        let vsum = _mm_hadd_ps(vsum, vsum);
        let vsum = _mm_hadd_ps(vsum, vsum);
        _mm_cvtss_f32(vsum)
    }
}

/// Loads 8 BF16 values (as u16) and widens them to 8 F32 lanes.
///
/// BF16 is the upper half of an F32 bit pattern, so widening is a 16-bit
/// left shift into the F32 slot.
#[inline]
#[target_feature(enable = "avx2")]
pub(crate) unsafe fn load_bf16_as_ps(ptr: *const u16) -> __m256 {
    unsafe {
        let v = _mm_loadu_si128(ptr as *const __m128i);
        _mm256_castsi256_ps(_mm256_slli_epi32(_mm256_cvtepu16_epi32(v), 16))
    }
}

/// Loads 8 F16 values (as u16) and widens them to 8 F32 lanes via F16C.
#[inline]
#[target_feature(enable = "f16c")]
pub(crate) unsafe fn load_f16_as_ps(ptr: *const u16) -> __m256 {
    unsafe { _mm256_cvtph_ps(_mm_loadu_si128(ptr as *const __m128i)) }
}
