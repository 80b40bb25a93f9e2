use askama::Template;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("unknown view {0:?}")]
    UnknownView(String),
    #[error(transparent)]
    Template(#[from] askama::Error),
}

#[derive(Template)]
#[template(path = "pages/index.html")]
struct IndexPage<'a> {
    title: &'a str,
}

#[derive(Template)]
#[template(path = "pages/register.html")]
struct RegisterPage<'a> {
    title: &'a str,
}

#[derive(Template)]
#[template(path = "pages/login.html")]
struct LoginPage<'a> {
    title: &'a str,
}

/// Renders a named page inside the shared layout.
pub fn render(view: &str, title: &str) -> Result<String, RenderError> {
    let html = match view {
        "index" => IndexPage { title }.render()?,
        "register" => RegisterPage { title }.render()?,
        "login" => LoginPage { title }.render()?,
        other => return Err(RenderError::UnknownView(other.to_string())),
    };
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_page_renders_inside_the_layout() {
        for view in ["index", "register", "login"] {
            let html = render(view, "T").expect("page should render");
            assert!(html.starts_with("<!DOCTYPE html>"), "{view} lost the layout");
            assert!(html.contains("<title>T | Signup</title>"), "{view} has no title");
            assert!(html.contains(r#"<a href="/login/""#), "{view} has no nav");
        }
    }

    #[test]
    fn register_page_carries_the_form_and_script() {
        let html = render("register", "Register").unwrap();
        assert!(html.contains(r#"id="registerForm""#));
        assert!(html.contains(r#"id="confirm-password""#));
        assert!(html.contains(r#"id="floatingMessage""#));
        assert!(html.contains(r#"<script src="/js/register.js"></script>"#));
    }

    #[test]
    fn title_is_escaped() {
        let html = render("index", "<script>").unwrap();
        assert!(html.contains("<title>&lt;script&gt; | Signup</title>"));
        assert!(!html.contains("<title><script>"));
    }

    #[test]
    fn unknown_view_is_an_error() {
        let err = render("nope", "x").unwrap_err();
        assert!(matches!(err, RenderError::UnknownView(v) if v == "nope"));
    }
}
