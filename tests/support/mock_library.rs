//! Mock library server for integration tests.
//!
//! Serves the login form, search, details pages and the page viewer the way
//! the real front end does, on a wiremock server.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbImage};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SESSION_COOKIE: &str = "PHPSESSID=test-session";
pub const LOGIN_FAILED_PAGE: &str = "<html><body><div class=\"error\">Пароль не верен. Пожалуйста, проверьте Ваше Имя и Пароль и попробуйте еще.</div></body></html>";
pub const NO_RESULTS_PAGE: &str =
    "<html><body><table><tr><td>Документы не найдены</td></tr></table></body></html>";

/// A wiremock server dressed up as the library.
pub struct MockLibrary {
    pub server: MockServer,
}

impl MockLibrary {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn base_url(&self) -> String {
        format!("{}/", self.server.uri())
    }

    /// Login page hands out the session cookie; the form accepts any credentials.
    pub async fn mount_login(&self) {
        self.mount_login_page().await;
        Mock::given(method("POST"))
            .and(path("/login.php"))
            .and(header("cookie", SESSION_COOKIE))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>Добро пожаловать</html>"))
            .mount(&self.server)
            .await;
    }

    /// Login form redirects to the details page of `id`.
    pub async fn mount_login_redirecting_to(&self, id: u64) {
        self.mount_login_page().await;
        Mock::given(method("POST"))
            .and(path("/login.php"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("Location", format!("/view.php?fDocumentId={id}").as_str()),
            )
            .mount(&self.server)
            .await;
    }

    pub async fn mount_login_rejected(&self) {
        self.mount_login_page().await;
        Mock::given(method("POST"))
            .and(path("/login.php"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_FAILED_PAGE))
            .mount(&self.server)
            .await;
    }

    async fn mount_login_page(&self) {
        Mock::given(method("GET"))
            .and(path("/login.php"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Set-Cookie", format!("{SESSION_COOKIE}; Path=/").as_str())
                    .set_body_string("<html><form action=\"login.php\"></form></html>"),
            )
            .mount(&self.server)
            .await;
    }

    pub async fn mount_search(&self, html: String) {
        Mock::given(method("POST"))
            .and(path("/search2.php"))
            .and(query_param("action", "process"))
            .and(header("cookie", SESSION_COOKIE))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&self.server)
            .await;
    }

    /// Details page of `id`, requested exactly `times` times.
    pub async fn mount_details(&self, id: u64, title: &str, times: u64) {
        Mock::given(method("GET"))
            .and(path("/view.php"))
            .and(query_param("fDocumentId", id.to_string().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_string(details_page(title)))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// Viewer serving `pages` for document `id`, then an HTML error page.
    pub async fn mount_pages(&self, id: u64, pages: &[Vec<u8>]) {
        let id = id.to_string();
        for page in 0..=pages.len() {
            Mock::given(method("GET"))
                .and(path("/plugins/SecView/HashAvailability.php"))
                .and(query_param("id", id.as_str()))
                .and(query_param("page", page.to_string().as_str()))
                .respond_with(ResponseTemplate::new(200).set_body_string("0"))
                .mount(&self.server)
                .await;
        }
        for (page, bytes) in pages.iter().enumerate() {
            Mock::given(method("GET"))
                .and(path("/plugins/SecView/getDoc.php"))
                .and(query_param("id", id.as_str()))
                .and(query_param("page", page.to_string().as_str()))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(bytes.clone()))
                .expect(1)
                .mount(&self.server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path("/plugins/SecView/getDoc.php"))
            .and(query_param("id", id.as_str()))
            .and(query_param("page", pages.len().to_string().as_str()))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<html>Страница не найдена</html>"),
            )
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Viewer that rejects document `id`; page images must never be requested.
    pub async fn mount_unknown_document(&self, id: u64) {
        let id = id.to_string();
        Mock::given(method("GET"))
            .and(path("/plugins/SecView/HashAvailability.php"))
            .and(query_param("id", id.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_string("1"))
            .mount(&self.server)
            .await;
        Mock::given(method("GET"))
            .and(path("/plugins/SecView/getDoc.php"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(jpeg_page()))
            .expect(0)
            .mount(&self.server)
            .await;
    }
}

pub fn results_page(books: &[(u64, &str, &str, u32)]) -> String {
    let rows: String = books
        .iter()
        .map(|(id, title, authors, year)| {
            format!(
                "<tr><td><input type=\"checkbox\"></td>\
                 <td><a href=\"view.php?fDocumentId={id}\">{title}</a></td>\
                 <td>Книга</td><td>{authors}</td><td>{year}</td></tr>"
            )
        })
        .collect();
    format!(
        "<html><body><table class=\"kt_collection\">\
         <tr><th></th><th>Название</th><th>Тип</th><th>Авторы</th><th>Год</th></tr>\
         {rows}</table></body></html>"
    )
}

pub fn details_page(title: &str) -> String {
    format!(
        "<html><body><h2>Документ: {title}</h2>\
         <table class=\"metadatatable\">\
         <tr><th>Автор:</th><td>Иванов И.И.</td></tr>\
         <tr><th>Год издания:</th><td>2004</td></tr>\
         </table></body></html>"
    )
}

/// A small JPEG scan.
pub fn jpeg_page() -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 12, image::Rgb([240, 240, 230])))
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
        .expect("encode jpeg page");
    buf
}

/// Counts `/Type /Page` objects in a PDF produced by the assembler.
pub fn pdf_page_count(bytes: &[u8]) -> usize {
    lopdf::Document::load_mem(bytes)
        .expect("output should be a readable PDF")
        .get_pages()
        .len()
}
