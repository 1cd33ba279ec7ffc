use std::env;
use std::fs::File;
use std::io::Write;
use std::path::Path;

fn main() {
    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("virtual_key.rs");
    let mut f = File::create(&dest_path).unwrap();

    // Generate the VirtualKey newtype wrapper
    writeln!(
        f,
        r#"
/// A single virtual-key code, the key space of the translation file.
///
/// This is a newtype wrapper around u8 for type safety.
/// The numeric values follow the Win32 `VK_*` definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct VirtualKey(pub u8);

impl VirtualKey {{
    /// Get the raw numeric code value
    pub const fn code(self) -> u8 {{
        self.0
    }}

    /// Get the name of this key
    pub fn name(self) -> &'static str {{
        key_name(self.0)
    }}
}}

impl From<u8> for VirtualKey {{
    fn from(code: u8) -> Self {{
        VirtualKey(code)
    }}
}}

impl From<VirtualKey> for u8 {{
    fn from(key: VirtualKey) -> Self {{
        key.0
    }}
}}

impl fmt::Display for VirtualKey {{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {{
        match key_name(self.0) {{
            "UNKNOWN" => write!(f, "0x{{:02X}}", self.0),
            name => f.write_str(name),
        }}
    }}
}}

impl FromStr for VirtualKey {{
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {{
        key_from_name(s).ok_or_else(|| KeyParseError(s.to_string()))
    }}
}}
"#
    )
    .unwrap();

    println!("cargo:rerun-if-changed=build.rs");
}
