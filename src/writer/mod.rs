mod text;

pub use text::Text;

use async_trait::async_trait;

use crate::{
    depot::Depot,
    http::{Request, Response},
};

/// Writes itself into a response, with access to the whole request context.
#[async_trait]
pub trait Writer {
    async fn write(mut self, req: &mut Request, depot: &mut Depot, res: &mut Response);
}

/// Renders itself into a response.
pub trait Piece {
    fn render(self, res: &mut Response);
}

#[async_trait]
impl<P> Writer for P
where
    P: Piece + Send,
{
    async fn write(mut self, _req: &mut Request, _depot: &mut Depot, res: &mut Response) {
        self.render(res)
    }
}

#[async_trait]
impl<T, E> Writer for Result<T, E>
where
    T: Writer + Send,
    E: Writer + Send,
{
    async fn write(mut self, req: &mut Request, depot: &mut Depot, res: &mut Response) {
        match self {
            Ok(v) => v.write(req, depot, res).await,
            Err(e) => e.write(req, depot, res).await,
        }
    }
}

impl Piece for () {
    fn render(self, _res: &mut Response) {}
}

impl Piece for &'static str {
    fn render(self, res: &mut Response) {
        Text::Plain(self).render(res)
    }
}

impl Piece for String {
    fn render(self, res: &mut Response) {
        Text::Plain(self).render(res)
    }
}

impl<'a> Piece for &'a String {
    fn render(self, res: &mut Response) {
        Text::Plain(self.clone()).render(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{header::CONTENT_TYPE, StatusCode};
    use crate::http::errors::StatusError;

    #[tokio::test]
    async fn test_write_result() {
        let mut req = Request::new();
        let mut depot = Depot::new();

        let mut res = Response::new();
        Result::<&'static str, StatusError>::Ok("hello")
            .write(&mut req, &mut depot, &mut res)
            .await;
        assert_eq!(res.body().size(), 5);
        assert_eq!(
            res.headers().get(CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );

        let mut res = Response::new();
        Result::<&'static str, StatusError>::Err(StatusError::not_acceptable())
            .write(&mut req, &mut depot, &mut res)
            .await;
        assert_eq!(res.status_code(), Some(StatusCode::NOT_ACCEPTABLE));
        assert!(res.body().is_none());
    }
}
