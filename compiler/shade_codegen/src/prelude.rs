//! Support header emitted ahead of generated code.
//!
//! Provides the fixed-width scalar aliases, `vec<T, N>` with element-wise
//! operators and `[]` component access, `array<T, N>`, and the helpers that
//! carry Python semantics for `**`, `//` and float `%`.

pub const PRELUDE: &str = r"// ---- shade prelude ----
#include <cmath>
#include <cstdint>
#include <type_traits>

using i8 = std::int8_t;
using i16 = std::int16_t;
using i32 = std::int32_t;
using i64 = std::int64_t;
using u8 = std::uint8_t;
using u16 = std::uint16_t;
using u32 = std::uint32_t;
using u64 = std::uint64_t;
using f16 = _Float16;
using f32 = float;
using f64 = double;

template <typename T, int N>
struct vec {
    T data[N];

    vec() : data{} {}
    explicit vec(T s) {
        for (int i = 0; i < N; ++i) data[i] = s;
    }
    template <typename... Ts, typename = std::enable_if_t<sizeof...(Ts) == N && (N > 1)>>
    vec(Ts... xs) : data{static_cast<T>(xs)...} {}

    T& operator[](int i) { return data[i]; }
    const T& operator[](int i) const { return data[i]; }
};

template <typename T, int N>
struct array {
    T data[N];

    T& operator[](int i) { return data[i]; }
    const T& operator[](int i) const { return data[i]; }
};

#define SHADE_VEC_BINARY(OP, R)                                                   \
    template <typename T, int N>                                                  \
    vec<R, N> operator OP(const vec<T, N>& a, const vec<T, N>& b) {               \
        vec<R, N> r;                                                              \
        for (int i = 0; i < N; ++i) r[i] = a[i] OP b[i];                          \
        return r;                                                                 \
    }                                                                             \
    template <typename T, int N>                                                  \
    vec<R, N> operator OP(const vec<T, N>& a, T b) {                              \
        vec<R, N> r;                                                              \
        for (int i = 0; i < N; ++i) r[i] = a[i] OP b;                             \
        return r;                                                                 \
    }                                                                             \
    template <typename T, int N>                                                  \
    vec<R, N> operator OP(T a, const vec<T, N>& b) {                              \
        vec<R, N> r;                                                              \
        for (int i = 0; i < N; ++i) r[i] = a OP b[i];                             \
        return r;                                                                 \
    }

SHADE_VEC_BINARY(+, T)
SHADE_VEC_BINARY(-, T)
SHADE_VEC_BINARY(*, T)
SHADE_VEC_BINARY(/, T)
SHADE_VEC_BINARY(%, T)
SHADE_VEC_BINARY(&, T)
SHADE_VEC_BINARY(|, T)
SHADE_VEC_BINARY(^, T)
SHADE_VEC_BINARY(<<, T)
SHADE_VEC_BINARY(>>, T)
SHADE_VEC_BINARY(==, bool)
SHADE_VEC_BINARY(!=, bool)
SHADE_VEC_BINARY(<, bool)
SHADE_VEC_BINARY(<=, bool)
SHADE_VEC_BINARY(>, bool)
SHADE_VEC_BINARY(>=, bool)
#undef SHADE_VEC_BINARY

#define SHADE_VEC_UNARY(OP)                                                       \
    template <typename T, int N>                                                  \
    vec<T, N> operator OP(const vec<T, N>& a) {                                   \
        vec<T, N> r;                                                              \
        for (int i = 0; i < N; ++i) r[i] = OP a[i];                               \
        return r;                                                                 \
    }

SHADE_VEC_UNARY(-)
SHADE_VEC_UNARY(+)
SHADE_VEC_UNARY(~)
SHADE_VEC_UNARY(!)
#undef SHADE_VEC_UNARY

template <typename T>
T __pow(T a, T b) {
    return static_cast<T>(std::pow(a, b));
}

template <typename T>
T __floordiv(T a, T b) {
    if constexpr (std::is_floating_point_v<T>) {
        return std::floor(a / b);
    } else {
        T q = a / b;
        if ((a % b != 0) && ((a < 0) != (b < 0))) --q;
        return q;
    }
}

template <typename T>
T __fmod(T a, T b) {
    T r = std::fmod(a, b);
    if (r != 0 && ((r < 0) != (b < 0))) r += b;
    return r;
}

#define SHADE_VEC_HELPER(F)                                                       \
    template <typename T, int N>                                                  \
    vec<T, N> F(const vec<T, N>& a, const vec<T, N>& b) {                         \
        vec<T, N> r;                                                              \
        for (int i = 0; i < N; ++i) r[i] = F(a[i], b[i]);                         \
        return r;                                                                 \
    }                                                                             \
    template <typename T, int N>                                                  \
    vec<T, N> F(const vec<T, N>& a, T b) {                                        \
        return F(a, vec<T, N>(b));                                                \
    }                                                                             \
    template <typename T, int N>                                                  \
    vec<T, N> F(T a, const vec<T, N>& b) {                                        \
        return F(vec<T, N>(a), b);                                                \
    }

SHADE_VEC_HELPER(__pow)
SHADE_VEC_HELPER(__floordiv)
SHADE_VEC_HELPER(__fmod)
#undef SHADE_VEC_HELPER
// ---- end prelude ----

";

#[cfg(test)]
mod tests {
    use super::PRELUDE;

    #[test]
    fn defines_every_helper_the_emitter_calls() {
        for helper in ["__pow", "__floordiv", "__fmod", "struct vec", "struct array"] {
            assert!(PRELUDE.contains(helper), "prelude lacks {helper}");
        }
    }
}
