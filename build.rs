fn main() {
    // Allow the extension module to leave Python symbols unresolved on macOS
    pyo3_build_config::add_extension_module_link_args();
}
