use crate::form::{FormError, LoginType};
use crate::user::User;

const FIELDS: [(&str, &str, &str); 2] = [
    ("username", "text", "kody"),
    ("password", "password", "twixrox"),
];

/// The login/register form, optionally showing why the last attempt failed.
pub fn login(redirect_to: &str, error: Option<&FormError>) -> String {
    let fields = error.and_then(|e| e.fields.as_ref());
    let selected = fields.map_or(LoginType::Login, |f| f.login_type);

    let mut body = String::new();

    body.push_str("<main class=\"prose rounded-lg border p-8 shadow-md\">\n<h1>Login</h1>\n");
    body.push_str("<form method=\"post\" action=\"/login\">\n");
    body.push_str(&format!(
        "<input type=\"hidden\" name=\"redirectTo\" value=\"{}\">\n",
        escape(redirect_to)
    ));

    body.push_str("<fieldset>\n<legend>Login or Register?</legend>\n");
    for login_type in LoginType::ALL {
        let checked = if login_type == selected { " checked" } else { "" };
        body.push_str(&format!(
            "<label><input type=\"radio\" name=\"loginType\" value=\"{login_type}\"{checked}> {login_type}</label>\n"
        ));
    }
    body.push_str("</fieldset>\n");

    for (field, kind, placeholder) in FIELDS {
        // never echo a password back
        let value = match (field, fields) {
            ("username", Some(f)) => escape(&f.username),
            _ => String::new(),
        };

        body.push_str(&format!(
            "<div><label for=\"{field}\">{field}</label>\
             <input id=\"{field}\" name=\"{field}\" type=\"{kind}\" placeholder=\"{placeholder}\" value=\"{value}\"></div>\n"
        ));

        if let Some(msg) = error.and_then(|e| e.field_error(field)) {
            body.push_str(&format!("<p role=\"alert\">{}</p>\n", escape(msg)));
        }
    }

    if let Some(e) = error {
        body.push_str(&format!(
            "<p role=\"alert\" id=\"error-message\">{}</p>\n",
            escape(&e.message)
        ));
    }

    body.push_str(&format!("<button type=\"submit\">{selected}</button>\n"));
    body.push_str("</form>\n</main>\n");

    document("Login", &body)
}

pub fn index(user: &User) -> String {
    let body = format!(
        "<main>\n<h1>Hi {}</h1>\n\
         <form method=\"post\" action=\"/logout\"><button type=\"submit\">Logout</button></form>\n\
         </main>\n",
        escape(&user.username)
    );

    document("Home", &body)
}

fn document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n<body>\n{body}</body>\n</html>\n"
    )
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::form::{FieldErrors, LoginFormFields};
    use crate::user::UserId;

    #[test]
    fn fresh_form() {
        let html = login("/jokes", None);

        assert!(html.contains(r#"name="redirectTo" value="/jokes""#));
        assert!(html.contains(r#"value="login" checked"#));
        assert!(!html.contains(r#"value="register" checked"#));
        assert!(html.contains("<button type=\"submit\">login</button>"));
        assert!(!html.contains("role=\"alert\""));
    }

    #[test]
    fn one_element_per_line() {
        let html = login("/", None);
        let has_line = |line: &str| html.lines().any(|l| l == line);

        assert!(has_line(r#"<input type="hidden" name="redirectTo" value="/">"#));
        assert!(has_line(
            r#"<label><input type="radio" name="loginType" value="login" checked> login</label>"#
        ));
        assert!(has_line(
            r#"<label><input type="radio" name="loginType" value="register"> register</label>"#
        ));
        assert!(has_line("<button type=\"submit\">login</button>"));
    }

    #[test]
    fn errors_are_shown_and_escaped() {
        let error = FormError {
            message: "Fields invalid".into(),
            field_errors: Some(FieldErrors {
                username: Some("Usernames must be at least 3 characters long".into()),
                password: None,
            }),
            fields: Some(LoginFormFields {
                login_type: LoginType::Register,
                username: "<b>".into(),
                password: "secret".into(),
            }),
        };

        let html = login("/", Some(&error));

        assert!(html.contains("<p role=\"alert\">Usernames must be at least 3 characters long</p>"));
        assert!(html.contains("id=\"error-message\">Fields invalid</p>"));
        assert!(html.contains(r#"value="&lt;b&gt;""#));
        assert!(!html.contains("secret"));
        assert!(html.contains(r#"value="register" checked"#));
        assert!(html.contains("<button type=\"submit\">register</button>"));
    }

    #[test]
    fn index_greets_user() {
        let html = index(&User {
            id: UserId(1),
            username: "kody & co".into(),
            password: "twixrox".into(),
        });

        assert!(html.contains("Hi kody &amp; co"));
        assert!(html.contains("action=\"/logout\""));
    }
}
