use mobywatel_form::form::{FormField, FormValues};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, mobywatel_form::form::FormField)]
enum SignupField {
    Email,
    FirstName,
    #[field(rename = "PESEL")]
    Pesel,
}

fn main() {
    assert_eq!(SignupField::ALL.len(), 3);
    assert_eq!(SignupField::FirstName.name(), "firstName");
    assert_eq!(SignupField::from_name("PESEL"), Some(SignupField::Pesel));
    assert_eq!(SignupField::from_name("pesel"), None);

    let values = FormValues::<SignupField>::blank().with(SignupField::Email, "a@b.pl");
    assert_eq!(values.text(SignupField::Email), Some("a@b.pl"));
}
