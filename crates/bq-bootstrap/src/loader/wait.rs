use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bigquery_rs::resources::job::{Job, JobReference};
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::ReusableBoxFuture;

use crate::warehouse::Warehouse;

pin_project_lite::pin_project! {
    /// Polls `jobs.get` until the job reports 'DONE', resolving to the finished job. Failed
    /// jobs still resolve successfully, the caller checks the final status.
    pub(crate) struct JobWait<'a, W> {
        warehouse: &'a W,
        job_ref: JobReference,
        request_fut: ReusableBoxFuture<'a, bigquery_rs::Result<Job>>,
        #[pin]
        poll_interval: Interval,
        state: State,
        polls: usize,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Requesting,
    Waiting,
    Done,
}

impl<'a, W: Warehouse> JobWait<'a, W> {
    pub(crate) fn new(warehouse: &'a W, job_ref: JobReference, frequency: Duration) -> Self {
        let mut poll_interval = tokio::time::interval(frequency);
        poll_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self {
            request_fut: ReusableBoxFuture::new(get_job(warehouse, job_ref.clone())),
            warehouse,
            job_ref,
            poll_interval,
            state: State::Requesting,
            polls: 0,
        }
    }
}

async fn get_job<W: Warehouse>(warehouse: &W, job_ref: JobReference) -> bigquery_rs::Result<Job> {
    warehouse.get_job(&job_ref).await
}

impl<W: Warehouse> Future for JobWait<'_, W> {
    type Output = bigquery_rs::Result<Job>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut this = self.project();

        loop {
            match *this.state {
                State::Done => panic!("JobWait polled after completion"),
                State::Requesting => {
                    let job = std::task::ready!(this.request_fut.poll(cx))?;
                    *this.polls += 1;

                    let Some(state) = job.status.as_ref().map(|status| status.state) else {
                        *this.state = State::Done;
                        return Poll::Ready(Err(bigquery_rs::Error::MissingField {
                            field: "status",
                        }));
                    };

                    debug!(
                        message = "polled load job",
                        job_id = %this.job_ref.job_id,
                        ?state,
                        polls = *this.polls,
                    );

                    if state.is_done() {
                        *this.state = State::Done;
                        return Poll::Ready(Ok(job));
                    }

                    // reset so the next request starts a full interval after this one finished
                    this.poll_interval.reset();
                    *this.state = State::Waiting;
                }
                State::Waiting => {
                    std::task::ready!(this.poll_interval.as_mut().poll_tick(cx));

                    *this.state = State::Requesting;
                    this.request_fut
                        .set(get_job(*this.warehouse, this.job_ref.clone()));
                }
            }
        }
    }
}
