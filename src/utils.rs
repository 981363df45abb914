use actix_web::http::header::ContentType;
use actix_web::HttpResponse;
use actix_web::HttpResponseBuilder;

/// Status fragments are injected straight into the popup, so they go out as
/// `text/html` whatever the status code
pub fn html_fragment(
    mut builder: HttpResponseBuilder,
    body: String,
) -> HttpResponse {
    builder.content_type(ContentType::html()).body(body)
}
