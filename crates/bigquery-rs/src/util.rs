pub(crate) fn append_to_path<I>(url: &reqwest::Url, parts: I) -> reqwest::Url
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut dst_url = url.clone();
    dst_url
        .path_segments_mut()
        .expect("can be a base")
        .pop_if_empty()
        .extend(parts);
    dst_url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_to_path() {
        let root = reqwest::Url::parse("https://bigquery.googleapis.com").unwrap();
        let url = append_to_path(&root, ["bigquery", "v2", "projects", "my project"]);
        let url = append_to_path(&url, ["datasets", "bq"]);

        assert_eq!(
            url.as_str(),
            "https://bigquery.googleapis.com/bigquery/v2/projects/my%20project/datasets/bq"
        );
    }
}
