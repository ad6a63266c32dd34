/// Declares a plain [`Union`](crate::Union) from a list of variant names.
///
/// The names are taken literally from the identifiers. A prefix can be given
/// after a semicolon.
///
/// # Examples
///
/// ```rust
/// use tunion::tagged_union;
///
/// let counter = tagged_union![Inc, Dec; prefix = "counter/"].unwrap();
/// assert_eq!(counter.ctor("Inc").unwrap().discriminant(), "counter/Inc");
/// ```
#[macro_export]
macro_rules! tagged_union {
    [] => [$crate::Union::new(::core::iter::empty::<&str>())];
    [$($name:ident),+ $(,)?] => [$crate::Union::new([$(stringify!($name)),+])];
    [$($name:ident),+ $(,)?; prefix = $prefix:expr] => [
        $crate::Union::with_options(
            [$(stringify!($name)),+],
            $crate::UnionOptions::new().with_prefix($prefix),
        )
    ];
}

/// Declares a [`SafeUnion`](crate::SafeUnion) from a list of variant names,
/// which may be arbitrary string literals.
///
/// # Examples
///
/// ```rust
/// use tunion::safe_union;
///
/// let u = safe_union!["match", ""].unwrap();
/// assert!(u.variants.contains("match"));
/// ```
#[macro_export]
macro_rules! safe_union {
    [] => [$crate::SafeUnion::new(::core::iter::empty::<&str>())];
    [$($name:literal),+ $(,)?] => [$crate::SafeUnion::new([$($name),+])];
}
