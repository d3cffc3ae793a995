pub mod mc_modern;

use std::{future::Future, net::SocketAddr};

pub trait Pinger {

    /// The data returned from a ping.
    type Data;

    /// A reported error value.
    type Error: std::error::Error;

    /// Pings `addr` directly. Address policy is the caller's job.
    fn ping(
        &self,
        addr: SocketAddr,
    ) -> impl Future<Output = Result<Self::Data, Self::Error>> + Send;
}
