fn main() {
    #[cfg(feature = "libhackrf")]
    {
        println!("cargo:rustc-link-lib=hackrf");
    }
}
