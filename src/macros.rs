/// Builds a [`FormMap`](crate::FormMap) from literal keys and value lists.
///
/// ```rust
/// use serde_form::form;
///
/// let form = form! {
///     "q" => ["rust"],
///     "tag" => ["serde", "forms"],
///     "empty" => [],
/// };
/// assert_eq!(form.get("q"), Some("rust"));
/// assert_eq!(form.get_all("tag").map(<[String]>::len), Some(2));
/// assert_eq!(form.get("empty"), None);
/// ```
#[macro_export]
macro_rules! form {
    () => {
        $crate::FormMap::new()
    };

    ($($key:expr => [$($value:expr),* $(,)?]),+ $(,)?) => {{
        let mut form = $crate::FormMap::new();
        $(
            form.insert($key, ::std::vec![$(::std::string::ToString::to_string(&$value)),*]);
        )+
        form
    }};
}

/// Implements `Deserialize` for a type through its `FromStr` implementation.
///
/// A missing value decodes as `Default::default()`.
///
/// ```rust
/// use serde_form::{form, from_text};
/// use std::str::FromStr;
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Hex(u32);
///
/// impl FromStr for Hex {
///     type Err = std::num::ParseIntError;
///     fn from_str(s: &str) -> Result<Self, Self::Err> {
///         u32::from_str_radix(s.trim_start_matches("0x"), 16).map(Hex)
///     }
/// }
///
/// from_text!(Hex);
///
/// #[derive(serde::Deserialize)]
/// struct Color { rgb: Hex, alpha: Hex }
///
/// let color: Color = serde_form::from_form(&form! { "rgb" => ["0xff8000"] }).unwrap();
/// assert_eq!(color.rgb, Hex(0xff8000));
/// assert_eq!(color.alpha, Hex(0));
/// ```
#[macro_export]
macro_rules! from_text {
    ($ty:ty) => {
        impl<'de> $crate::__private::serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
            where
                D: $crate::__private::serde::Deserializer<'de>,
            {
                deserializer.deserialize_newtype_struct(
                    ::std::stringify!($ty),
                    $crate::text::TextVisitor::<$ty>::or_default(),
                )
            }
        }
    };
}

/// Implements both `Serialize` (through `Display`) and `Deserialize`
/// (through `FromStr`) for a type, making it a form leaf.
///
/// ```rust
/// use serde_form::{form, text_leaf, Engine};
/// use std::fmt;
/// use std::str::FromStr;
///
/// #[derive(Debug, Default, Clone, Copy, PartialEq)]
/// struct Flag(bool);
///
/// impl fmt::Display for Flag {
///     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         f.write_str(if self.0 { "yes" } else { "no" })
///     }
/// }
///
/// impl FromStr for Flag {
///     type Err = String;
///     fn from_str(s: &str) -> Result<Self, Self::Err> {
///         match s {
///             "yes" => Ok(Flag(true)),
///             "no" => Ok(Flag(false)),
///             other => Err(format!("not a flag: {other}")),
///         }
///     }
/// }
///
/// text_leaf!(Flag);
///
/// #[derive(serde::Serialize, serde::Deserialize, Default)]
/// struct Prefs { beta: Flag }
///
/// let engine = Engine::new();
/// let (form, _) = engine.encode(&Prefs { beta: Flag(true) });
/// assert_eq!(form.get("beta"), Some("yes"));
///
/// let (prefs, errors) = engine.decode_new::<Prefs>(&form! { "beta" => ["no"] });
/// assert!(errors.is_empty());
/// assert_eq!(prefs.unwrap().beta, Flag(false));
/// ```
#[macro_export]
macro_rules! text_leaf {
    ($ty:ty) => {
        impl $crate::__private::serde::Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
            where
                S: $crate::__private::serde::Serializer,
            {
                serializer.serialize_newtype_struct(
                    ::std::stringify!($ty),
                    &::std::string::ToString::to_string(self),
                )
            }
        }

        $crate::from_text!($ty);
    };
}
