use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginType {
    Login,
    Register,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginFormFields {
    pub login_type: LoginType,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// A failed submission, shown to the user next to the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormError {
    pub message: String,
    pub field_errors: Option<FieldErrors>,
    pub fields: Option<LoginFormFields>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub fields: LoginFormFields,
    pub redirect_to: String,
}

impl LoginType {
    pub const ALL: [LoginType; 2] = [LoginType::Login, LoginType::Register];

    pub fn as_str(&self) -> &'static str {
        match self {
            LoginType::Login => "login",
            LoginType::Register => "register",
        }
    }
}

impl FromStr for LoginType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login" => Ok(LoginType::Login),
            "register" => Ok(LoginType::Register),
            _ => Err(()),
        }
    }
}

impl fmt::Display for LoginType {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

impl FieldErrors {
    pub fn any(&self) -> bool {
        self.username.is_some() || self.password.is_some()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        match field {
            "username" => self.username.as_deref(),
            "password" => self.password.as_deref(),
            _ => None,
        }
    }
}

impl FormError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field_errors: None,
            fields: None,
        }
    }

    pub fn with_fields(mut self, fields: LoginFormFields) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.field_errors.as_ref().and_then(|errs| errs.get(field))
    }
}

impl fmt::Display for FormError {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(&self.message)
    }
}

impl std::error::Error for FormError {}

/// A submitted form, in field order. Repeated fields keep their first value.
pub type FormData = [(String, String)];

pub fn field<'a>(form: &'a FormData, name: &str) -> Option<&'a str> {
    form.iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

/// `redirectTo`, or `/` when missing or empty.
pub fn redirect_to(form: &FormData) -> &str {
    field(form, "redirectTo")
        .filter(|r| !r.is_empty())
        .unwrap_or("/")
}

pub fn validate_submission(form: &FormData) -> Result<Submission, FormError> {
    let login_type = field(form, "loginType").and_then(|t| t.parse().ok());
    let username = field(form, "username");
    let password = field(form, "password");
    let redirect_to = redirect_to(form);

    let (Some(login_type), Some(username), Some(password)) = (login_type, username, password)
    else {
        return Err(FormError::new("Form not submitted correctly."));
    };

    let fields = LoginFormFields {
        login_type,
        username: username.into(),
        password: password.into(),
    };

    let field_errors = FieldErrors {
        username: validate_username(username),
        password: validate_password(password),
    };

    if field_errors.any() {
        return Err(FormError {
            message: "Fields invalid".into(),
            field_errors: Some(field_errors),
            fields: Some(fields),
        });
    }

    Ok(Submission {
        fields,
        redirect_to: redirect_to.into(),
    })
}

// lengths are in UTF-16 code units, as browsers count them
fn length(s: &str) -> usize {
    s.encode_utf16().count()
}

pub fn validate_username(username: &str) -> Option<String> {
    (length(username) < 3).then(|| "Usernames must be at least 3 characters long".into())
}

pub fn validate_password(password: &str) -> Option<String> {
    (length(password) < 6).then(|| "Passwords must be at least 6 characters long".into())
}

#[cfg(test)]
mod test {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn valid_submission() {
        let sub = validate_submission(&form(&[
            ("loginType", "register"),
            ("username", "kody"),
            ("password", "hunter2"),
            ("redirectTo", "/jokes"),
        ]))
        .unwrap();

        assert_eq!(sub.fields.login_type, LoginType::Register);
        assert_eq!(sub.fields.username, "kody");
        assert_eq!(sub.redirect_to, "/jokes");
    }

    #[test]
    fn redirect_defaults_to_root() {
        let base = [
            ("loginType", "login"),
            ("username", "kody"),
            ("password", "twixrox"),
        ];

        let sub = validate_submission(&form(&base)).unwrap();
        assert_eq!(sub.redirect_to, "/");

        let mut with_empty = form(&base);
        with_empty.push(("redirectTo".into(), "".into()));
        let sub = validate_submission(&with_empty).unwrap();
        assert_eq!(sub.redirect_to, "/");
    }

    #[test]
    fn malformed_submissions() {
        let cases = [
            form(&[("username", "kody"), ("password", "twixrox")]),
            form(&[("loginType", "admin"), ("username", "kody"), ("password", "twixrox")]),
            form(&[("loginType", "login"), ("password", "twixrox")]),
            form(&[("loginType", "login"), ("username", "kody")]),
        ];

        for case in cases {
            let err = validate_submission(&case).unwrap_err();
            assert_eq!(err.message, "Form not submitted correctly.");
            assert_eq!(err.field_errors, None);
            assert_eq!(err.fields, None);
        }
    }

    #[test]
    fn short_username_fails_regardless_of_password() {
        for password in ["", "short", "long enough"] {
            let err = validate_submission(&form(&[
                ("loginType", "login"),
                ("username", "ko"),
                ("password", password),
            ]))
            .unwrap_err();

            assert_eq!(err.message, "Fields invalid");
            assert_eq!(
                err.field_error("username"),
                Some("Usernames must be at least 3 characters long")
            );
            assert_eq!(err.fields.unwrap().username, "ko");
        }
    }

    #[test]
    fn short_password_fails_regardless_of_username() {
        for username in ["", "ko", "kody"] {
            let err = validate_submission(&form(&[
                ("loginType", "register"),
                ("username", username),
                ("password", "12345"),
            ]))
            .unwrap_err();

            assert_eq!(
                err.field_error("password"),
                Some("Passwords must be at least 6 characters long")
            );
        }
    }

    #[test]
    fn lengths_are_counted_in_utf16_units() {
        assert_eq!(validate_username("äöü"), None);
        assert!(validate_username("äö").is_some());
        assert_eq!(validate_password("123456"), None);

        // astral characters are two units each
        assert_eq!(validate_username("😀😀"), None);
        assert!(validate_username("😀").is_some());
        assert_eq!(validate_password("😀😀😀"), None);
        assert!(validate_password("😀😀").is_some());
    }

    #[test]
    fn repeated_fields_keep_first_value() {
        let sub = validate_submission(&form(&[
            ("loginType", "login"),
            ("loginType", "register"),
            ("username", "kody"),
            ("password", "twixrox"),
            ("redirectTo", "/jokes"),
            ("redirectTo", "/other"),
        ]))
        .unwrap();

        assert_eq!(sub.fields.login_type, LoginType::Login);
        assert_eq!(sub.redirect_to, "/jokes");
    }
}
