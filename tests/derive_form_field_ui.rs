#[test]
fn form_field_derive_ui() {
    let testcases = trybuild::TestCases::new();
    testcases.pass("tests/ui/form_field/pass.rs");
}
